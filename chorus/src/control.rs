//! Terminal control surface. Reads one command per line and drives the
//! chorus controller.

use anyhow::{Context, anyhow};
use chorus_core::ChorusController;
use std::{
    io::{BufRead, Write},
    str::FromStr,
};

pub const HELP: &str = "\
commands:
  delay <0-100>     delay time in ms
  depth <0-100>     modulation depth
  rate <0-100>      LFO rate in hundredths of a Hz
  feedback <0-100>  delay feedback
  mix <0-100>       dry level (100 = dry only)
  toggle            switch the chorus on or off
  on | off          switch the chorus on or off explicitly
  show              print every parameter
  help              print this message
  quit              exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Delay(i32),
    Depth(i32),
    Rate(i32),
    Feedback(i32),
    Mix(i32),
    Toggle,
    On,
    Off,
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().ok_or_else(|| anyhow!("empty command"))?;
        let name = name.to_lowercase();
        let value = words.next();
        if let Some(extra) = words.next() {
            anyhow::bail!("unexpected argument {extra:?} to {name}");
        }
        let control = || -> anyhow::Result<i32> {
            let value =
                value.ok_or_else(|| anyhow!("{name} needs a value (0-100)"))?;
            value
                .parse()
                .with_context(|| format!("invalid value {value:?} for {name}"))
        };
        let no_value = |command| {
            if value.is_some() {
                anyhow::bail!("{name} doesn't take a value");
            }
            Ok(command)
        };
        match name.as_str() {
            "delay" => Ok(Self::Delay(control()?)),
            "depth" => Ok(Self::Depth(control()?)),
            "rate" => Ok(Self::Rate(control()?)),
            "feedback" => Ok(Self::Feedback(control()?)),
            "mix" => Ok(Self::Mix(control()?)),
            "toggle" => no_value(Self::Toggle),
            "on" => no_value(Self::On),
            "off" => no_value(Self::Off),
            "show" => no_value(Self::Show),
            "help" => no_value(Self::Help),
            "quit" | "exit" => no_value(Self::Quit),
            _ => anyhow::bail!("unknown command {name:?} (try \"help\")"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Text(String),
    Quit,
}

pub fn execute(
    controller: &mut ChorusController,
    command: Command,
) -> anyhow::Result<Response> {
    let text = match command {
        Command::Delay(value) => controller.set_delay_ms(value)?,
        Command::Depth(value) => controller.set_depth(value),
        Command::Rate(value) => controller.set_lfo_rate(value),
        Command::Feedback(value) => controller.set_feedback(value),
        Command::Mix(value) => controller.set_mix(value),
        Command::Toggle => controller.toggle_enabled(),
        Command::On => controller.set_enabled(true),
        Command::Off => controller.set_enabled(false),
        Command::Show => {
            controller.labels().iter().collect::<Vec<_>>().join("\n")
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Response::Quit),
    };
    Ok(Response::Text(text))
}

/// Runs until `quit` or the end of `input`. Bad commands and failed updates
/// are reported on `output` and don't stop the loop.
pub fn run<R: BufRead, W: Write>(
    controller: &mut ChorusController,
    input: R,
    mut output: W,
) -> anyhow::Result<()> {
    writeln!(output, "{HELP}")?;
    for line in controller.labels().iter() {
        writeln!(output, "{line}")?;
    }
    for line in input.lines() {
        let line = line.context("failed to read command")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = line
            .parse::<Command>()
            .and_then(|command| execute(controller, command));
        match response {
            Ok(Response::Text(text)) => writeln!(output, "{text}")?,
            Ok(Response::Quit) => break,
            Err(e) => {
                log::debug!("command {line:?} failed: {e:#}");
                writeln!(output, "error: {e:#}")?;
            }
        }
        output.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use chorus_core::{ChorusEngine, EngineConfig, HANDOFF_QUEUE_CAPACITY};
    use std::io::Cursor;

    fn run_script(controller: &mut ChorusController, script: &str) -> String {
        let mut output = Vec::new();
        run(controller, Cursor::new(script), &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!("delay 50".parse::<Command>().unwrap(), Command::Delay(50));
        assert_eq!(" Mix  -3 ".parse::<Command>().unwrap(), Command::Mix(-3));
        assert_eq!("toggle".parse::<Command>().unwrap(), Command::Toggle);
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
        assert!("delay".parse::<Command>().is_err());
        assert!("delay fifty".parse::<Command>().is_err());
        assert!("delay 1 2".parse::<Command>().is_err());
        assert!("toggle 1".parse::<Command>().is_err());
        assert!("flanger 3".parse::<Command>().is_err());
    }

    #[test]
    fn commands_print_labels() {
        let (_engine, mut controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        let output = run_script(
            &mut controller,
            "delay 50\ndepth 40\nrate 75\nfeedback 20\nmix 100\ntoggle\n",
        );
        let lines: Vec<&str> = output.lines().rev().take(6).collect();
        assert_eq!(
            lines,
            vec![
                "Chorus: On",
                "Mix: 1.00",
                "Feedback: 0.20",
                "LFO Rate: 0.75",
                "Depth: 0.40",
                "Chorus Delay: 50.00 ms",
            ]
        );
        assert!(controller.params().enabled);
    }

    #[test]
    fn errors_are_reported_and_the_loop_continues() {
        let (_engine, mut controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        let output =
            run_script(&mut controller, "wobble\ndepth x\n\nmix 20\n");
        assert_eq!(output.matches("error:").count(), 2);
        assert!(output.ends_with("Mix: 0.20\n"));
    }

    #[test]
    fn quit_stops_reading() {
        let (_engine, mut controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        let output = run_script(&mut controller, "quit\nmix 20\n");
        assert!(!output.contains("Mix: 0.20"));
        assert_eq!(controller.params().mix, 0.5);
    }

    #[test]
    fn show_prints_every_label() {
        let (_engine, mut controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        let Response::Text(text) =
            execute(&mut controller, Command::Show).unwrap()
        else {
            panic!("expected text");
        };
        assert_eq!(
            text,
            "Chorus Delay: 25.00 ms\nDepth: 0.50\nLFO Rate: 0.50\n\
             Feedback: 0.30\nMix: 0.50\nChorus: Off"
        );
    }

    #[test]
    fn failed_delay_change_is_reported() {
        let (_engine, mut controller) =
            ChorusEngine::new(EngineConfig::default()).unwrap();
        // nothing is processing blocks, so the hand-off queue fills up
        let script: String = (0..=HANDOFF_QUEUE_CAPACITY)
            .map(|i| format!("delay {}\n", 10 + i))
            .collect();
        let output = run_script(&mut controller, &script);
        assert_eq!(output.matches("error:").count(), 1);
        assert_eq!(
            controller.params().delay_ms,
            (10 + HANDOFF_QUEUE_CAPACITY - 1) as u32
        );
    }
}
