//! Message-driven session boundary
//!
//! A `ProtocolHandler` owns at most one session. `init` replaces it, `cell`
//! fills its canvas, and `done` validates the canvas and runs the scan,
//! streaming events into the caller's sink.

use crate::error::{RasterError, Result};
use crate::raster::{self, Canvas};
use crate::sink::EventSink;
use crate::types::{Event, Message, Settings};
use serde_json::Value;
use tracing::{debug, info};

/// Settings and canvas for one conversion
#[derive(Debug, Clone)]
pub struct Session {
    settings: Settings,
    canvas: Canvas,
}

impl Session {
    pub fn new(settings: Settings) -> Result<Self> {
        let canvas = Canvas::new(&settings)?;
        Ok(Self { settings, canvas })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}

#[derive(Debug, Default)]
pub struct ProtocolHandler {
    session: Option<Session>,
}

impl ProtocolHandler {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or(RasterError::UninitializedSession)
    }

    pub fn handle<S: EventSink + ?Sized>(&mut self, message: Message, sink: &mut S) -> Result<()> {
        match message {
            Message::Init { data } => {
                let session = Session::new(data)?;
                let (rows, cols) = session.canvas.grid_size();
                info!(
                    width = session.settings.image_size.width,
                    height = session.settings.image_size.height,
                    tiles = rows * cols,
                    "Session initialized"
                );
                self.session = Some(session);
                Ok(())
            }
            Message::Cell { x, y, data } => self.session_mut()?.canvas.insert_tile(x, y, data),
            Message::Done => {
                let session = self.session_mut()?;
                debug!(tiles = session.canvas.tile_count(), "Canvas assembled");
                raster::rasterize(&session.settings, &session.canvas, sink)
            }
        }
    }

    /// Parse and handle one JSON message. A message may also arrive as a
    /// JSON string wrapping the message object.
    pub fn handle_json<S: EventSink + ?Sized>(&mut self, raw: &str, sink: &mut S) -> Result<()> {
        let message = parse_message(raw)?;
        self.handle(message, sink)
    }

    /// Forward an error to the sink as an `error` event
    pub fn report<S: EventSink + ?Sized>(err: &RasterError, sink: &mut S) -> Result<()> {
        sink.emit(Event::error(err))
    }
}

pub fn parse_message(raw: &str) -> Result<Message> {
    let value: Value = serde_json::from_str(raw)?;
    let message = match value {
        Value::String(inner) => serde_json::from_str(&inner)?,
        other => serde_json::from_value(other)?,
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_before_init() {
        let mut handler = ProtocolHandler::new();
        let mut events = Vec::new();
        let result = handler.handle(
            Message::Cell {
                x: 0,
                y: 0,
                data: vec![0, 0, 0, 255],
            },
            &mut events,
        );
        assert!(matches!(result, Err(RasterError::UninitializedSession)));
    }

    #[test]
    fn test_done_before_init() {
        let mut handler = ProtocolHandler::new();
        let mut events = Vec::new();
        assert!(matches!(
            handler.handle(Message::Done, &mut events),
            Err(RasterError::UninitializedSession)
        ));
        assert!(events.is_empty());
    }

    #[test]
    fn test_init_rejects_invalid_settings() {
        let mut handler = ProtocolHandler::new();
        let mut events = Vec::new();
        let result = handler.handle(
            Message::Init {
                data: Settings::new(2, 2, 0),
            },
            &mut events,
        );
        assert!(matches!(result, Err(RasterError::InvalidSettings(_))));
        assert!(handler.session().is_none());
    }

    #[test]
    fn test_init_replaces_session() {
        let mut handler = ProtocolHandler::new();
        let mut events = Vec::new();
        handler
            .handle(
                Message::Init {
                    data: Settings::new(1, 1, 1),
                },
                &mut events,
            )
            .unwrap();
        handler
            .handle(
                Message::Cell {
                    x: 0,
                    y: 0,
                    data: vec![0, 0, 0, 255],
                },
                &mut events,
            )
            .unwrap();
        assert_eq!(handler.session().unwrap().canvas().tile_count(), 1);

        handler
            .handle(
                Message::Init {
                    data: Settings::new(3, 3, 3),
                },
                &mut events,
            )
            .unwrap();
        let session = handler.session().unwrap();
        assert_eq!(session.canvas().tile_count(), 0);
        assert_eq!(session.settings().image_size.width, 3);
    }

    #[test]
    fn test_parse_string_wrapped_message() {
        let raw = r#""{\"type\":\"done\"}""#;
        assert_eq!(parse_message(raw).unwrap(), Message::Done);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        assert!(matches!(
            parse_message(r#"{"type":"pause"}"#),
            Err(RasterError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_coordinates() {
        assert!(parse_message(r#"{"type":"cell","x":-1,"y":0,"data":[]}"#).is_err());
    }

    #[test]
    fn test_report_emits_error_event() {
        let mut events = Vec::new();
        ProtocolHandler::report(&RasterError::UninitializedSession, &mut events).unwrap();
        match &events[0] {
            Event::Error { data } => assert_eq!(data.kind, "UninitializedSession"),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
