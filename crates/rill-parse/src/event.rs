//! Structural events emitted by the parser.

use crate::{NodeId, Position};

/// What kind of block a `BlockStart` opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A nested mapping.
    Mapping,
    /// A sequence.
    Sequence,
    /// One `- ` item of a sequence.
    SequenceItem,
}

/// Events emitted by the parser, in token-consumption order.
///
/// Events produced by a `write` are delivered before that `write` returns;
/// their sequence for a prefix of the input is a prefix of the sequence for
/// any extension of it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    /// A comment line (only with `preserve_comments`).
    Line {
        /// Comment text, without the leading `#`.
        text: String,
        /// Position of the `#`.
        pos: Position,
    },
    /// A mapping key was read.
    Key {
        /// The key text.
        name: String,
        /// Position of the key.
        pos: Position,
    },
    /// A scalar value was attached.
    Value {
        /// The scalar text.
        text: String,
        /// Whether it was quoted (exempt from coercion).
        quoted: bool,
        /// Position of the scalar.
        pos: Position,
    },
    /// A block was opened.
    BlockStart {
        /// The kind of block.
        kind: BlockKind,
        /// Position of the opening token.
        pos: Position,
    },
    /// A block was closed.
    BlockEnd {
        /// Position of the closing token.
        pos: Position,
    },
    /// An indentation level was entered.
    Indent {
        /// The new level.
        level: usize,
        /// Position of the first token at the new level.
        pos: Position,
    },
    /// An indentation level was left.
    Dedent {
        /// The target level.
        level: usize,
        /// Position where the dedent was noticed.
        pos: Position,
    },
    /// An intent subtree's discriminator became known.
    ///
    /// Fires at most once per node identity between resets.
    IntentReady {
        /// The intent's `type` discriminator.
        intent_type: String,
        /// The intent mapping node.
        node: NodeId,
        /// Position of the intent mapping.
        pos: Position,
    },
}

/// Event kinds, used to index listener registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// See [`ParseEvent::Line`].
    Line,
    /// See [`ParseEvent::Key`].
    Key,
    /// See [`ParseEvent::Value`].
    Value,
    /// See [`ParseEvent::BlockStart`].
    BlockStart,
    /// See [`ParseEvent::BlockEnd`].
    BlockEnd,
    /// See [`ParseEvent::Indent`].
    Indent,
    /// See [`ParseEvent::Dedent`].
    Dedent,
    /// See [`ParseEvent::IntentReady`].
    IntentReady,
}

impl EventKind {
    /// Number of event kinds.
    pub const COUNT: usize = 8;

    /// Dense index for listener tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl ParseEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ParseEvent::Line { .. } => EventKind::Line,
            ParseEvent::Key { .. } => EventKind::Key,
            ParseEvent::Value { .. } => EventKind::Value,
            ParseEvent::BlockStart { .. } => EventKind::BlockStart,
            ParseEvent::BlockEnd { .. } => EventKind::BlockEnd,
            ParseEvent::Indent { .. } => EventKind::Indent,
            ParseEvent::Dedent { .. } => EventKind::Dedent,
            ParseEvent::IntentReady { .. } => EventKind::IntentReady,
        }
    }

    /// The event's source position.
    pub fn pos(&self) -> Position {
        match self {
            ParseEvent::Line { pos, .. }
            | ParseEvent::Key { pos, .. }
            | ParseEvent::Value { pos, .. }
            | ParseEvent::BlockStart { pos, .. }
            | ParseEvent::BlockEnd { pos }
            | ParseEvent::Indent { pos, .. }
            | ParseEvent::Dedent { pos, .. }
            | ParseEvent::IntentReady { pos, .. } => *pos,
        }
    }
}
