use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use laser_raster::{EventSink, GcodeWriter, JsonLinesWriter, ProtocolHandler};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Plain G-code text
    Gcode,
    /// One outbound JSON event per line
    Events,
}

/// Rasterize tiled images into laser engraving G-code.
///
/// Reads newline-delimited JSON messages (`init`, `cell`, `done`).
#[derive(Debug, Parser)]
#[command(name = "laser-raster", version)]
struct Cli {
    /// Message file, stdin when omitted
    input: Option<PathBuf>,

    /// Output file, stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Format::Gcode)]
    format: Format,

    /// -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path)
                .with_context(|| format!("Error reading input file '{}'", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Error writing output file '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut sink: Box<dyn EventSink> = match cli.format {
        Format::Gcode => Box::new(GcodeWriter::new(writer)),
        Format::Events => Box::new(JsonLinesWriter::new(writer)),
    };

    process_messages(reader, sink.as_mut())
}

/// Feed every non-blank line to one session. The first failing message is
/// reported to the sink and returned; a failure to report it is only logged.
fn process_messages<R: BufRead>(reader: R, sink: &mut dyn EventSink) -> Result<()> {
    let mut handler = ProtocolHandler::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Error reading message")?;
        if line.trim().is_empty() {
            continue;
        }

        if let Err(err) = handler.handle_json(&line, sink) {
            if let Err(report_err) = ProtocolHandler::report(&err, sink) {
                tracing::warn!("Could not emit error event: {}", report_err);
            }
            return Err(err).with_context(|| format!("Message {} failed", index + 1));
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        tracing::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_raster::{Event, RasterError};
    use std::io::Cursor;

    /// Accepts G-code but refuses error events
    struct NoErrorSink(Vec<Event>);

    impl EventSink for NoErrorSink {
        fn emit(&mut self, event: Event) -> laser_raster::Result<()> {
            match event {
                Event::Error { .. } => Err(RasterError::SinkClosed),
                other => {
                    self.0.push(other);
                    Ok(())
                }
            }
        }
    }

    #[test]
    fn test_process_reports_failure() {
        let input = Cursor::new("\n{\"type\":\"done\"}\n");
        let mut events: Vec<Event> = Vec::new();

        let err = process_messages(input, &mut events).unwrap_err();
        assert!(format!("{:#}", err).contains("Message 2 failed"));
        assert!(matches!(&events[..], [Event::Error { .. }]));
    }

    #[test]
    fn test_process_keeps_original_error_when_report_fails() {
        let input = Cursor::new("{\"type\":\"done\"}\n");
        let mut sink = NoErrorSink(Vec::new());

        let err = process_messages(input, &mut sink).unwrap_err();
        let cause = err.downcast_ref::<RasterError>().unwrap();
        assert!(matches!(cause, RasterError::UninitializedSession));
        assert!(sink.0.is_empty());
    }
}
