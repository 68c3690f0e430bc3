//! Event sinks
//!
//! Rasterization output is streamed one event per row. A sink decides
//! where those events go: memory, a channel, or a writer.

use crate::error::{RasterError, Result};
use crate::types::Event;
use std::io::Write;
use std::sync::mpsc::Sender;

/// Receiver of rasterization events, called in emission order
pub trait EventSink {
    fn emit(&mut self, event: Event) -> Result<()>;
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl EventSink for Sender<Event> {
    fn emit(&mut self, event: Event) -> Result<()> {
        self.send(event).map_err(|_| RasterError::SinkClosed)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: Event) -> Result<()> {
        (**self).emit(event)
    }
}

/// Writes plain G-code text: the header as-is, each row followed by a newline
pub struct GcodeWriter<W: Write> {
    writer: W,
}

impl<W: Write> GcodeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for GcodeWriter<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Gcode { data } => {
                self.writer.write_all(data.text.as_bytes())?;
                if data.line.is_some() {
                    self.writer.write_all(b"\n")?;
                }
            }
            Event::Finished => self.writer.flush()?,
            Event::Error { .. } => {}
        }
        Ok(())
    }
}

/// Writes every event as one JSON object per line
pub struct JsonLinesWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesWriter<W> {
    fn emit(&mut self, event: Event) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &event)
            .map_err(|e| RasterError::Io(e.into()))?;
        self.writer.write_all(b"\n")?;
        if matches!(event, Event::Finished | Event::Error { .. }) {
            self.writer.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_gcode_writer_concatenates() {
        let mut sink = GcodeWriter::new(Vec::new());
        sink.emit(Event::header("; header\n".to_string())).unwrap();
        sink.emit(Event::row(1, "G0 X0.50 Y0.50".to_string())).unwrap();
        sink.emit(Event::row(0, "G0 X0.50 Y1.50".to_string())).unwrap();
        sink.emit(Event::Finished).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "; header\nG0 X0.50 Y0.50\nG0 X0.50 Y1.50\n");
    }

    #[test]
    fn test_json_lines_writer() {
        let mut sink = JsonLinesWriter::new(Vec::new());
        sink.emit(Event::row(2, "G1 X0.00 S1.0000".to_string()))
            .unwrap();
        sink.emit(Event::Finished).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"type":"gcode","data":{"line":2,"text":"G1 X0.00 S1.0000"}}"#
        );
        assert_eq!(lines[1], r#"{"type":"done"}"#);
    }

    #[test]
    fn test_closed_channel() {
        let (mut tx, rx) = mpsc::channel();
        drop(rx);
        assert!(matches!(
            tx.emit(Event::Finished),
            Err(RasterError::SinkClosed)
        ));
    }
}
