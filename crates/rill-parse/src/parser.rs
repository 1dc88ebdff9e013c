//! Stack-driven structural parser.
//!
//! The parser owns a [`Tokenizer`], drains its tokens into a small queue,
//! and folds them into an arena-backed tree while emitting [`ParseEvent`]s.
//! Tokens whose handling needs one token of lookahead (`Indent`, `Dash`,
//! `Newline`) wait in the queue until the lookahead token exists or the
//! input is finishing, so the parser is always safe to leave mid-document
//! and inspect through [`Parser::root`].
//!
//! Structural problems never abort a parse; they are recorded as
//! diagnostics and the tree stays best-effort.

use std::collections::{HashSet, VecDeque};

use crate::ast::{AstNode, EmptyHint, NodeArena, NodeId};
use crate::event::{BlockKind, ParseEvent};
use crate::trace;
use crate::{Diagnostic, Options, Position, Token, TokenKind, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Mapping,
    Sequence,
}

/// A key waiting for its value.
#[derive(Debug, Clone)]
struct PendingKey {
    name: String,
    pos: Position,
}

/// One level of the open-block stack. The frame's node is already attached
/// to its parent, so popping is bookkeeping only.
#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    node: NodeId,
    indent: usize,
    pending_key: Option<PendingKey>,
}

/// Event-emitting structural parser for rill documents.
pub struct Parser {
    opts: Options,
    tokenizer: Tokenizer,
    arena: NodeArena,
    /// Open frames; index 0 is the root frame once it exists.
    stack: Vec<Frame>,
    queue: VecDeque<Token>,
    events: Vec<ParseEvent>,
    diagnostics: Vec<Diagnostic>,
    emitted_intents: HashSet<NodeId>,
    finished: bool,
}

impl Parser {
    /// Create a parser with the given options.
    pub fn new(opts: Options) -> Self {
        Self {
            tokenizer: Tokenizer::new(opts.clone()),
            opts,
            arena: NodeArena::new(),
            stack: Vec::new(),
            queue: VecDeque::new(),
            events: Vec::new(),
            diagnostics: Vec::new(),
            emitted_intents: HashSet::new(),
            finished: false,
        }
    }

    /// Feed a chunk of input and consume every token it completes.
    pub fn write(&mut self, chunk: &str) {
        self.tokenizer.write(chunk);
        self.pump();
    }

    /// Finalize the tokenizer and consume all remaining tokens.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        for token in self.tokenizer.finalize() {
            self.queue.push_back(token);
        }
        self.process_queue();
        self.diagnostics
            .append(&mut self.tokenizer.take_diagnostics());
    }

    /// Whether `finish` has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The configured options.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// The node arena.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The root node, if any structural token has arrived yet.
    pub fn root(&self) -> Option<NodeId> {
        self.stack.first().map(|f| f.node)
    }

    /// Borrow a node.
    pub fn node(&self, id: NodeId) -> &AstNode {
        self.arena.get(id)
    }

    /// Take the events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<ParseEvent> {
        std::mem::take(&mut self.events)
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take and clear the recorded diagnostics.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Root-mapping entries whose key is in the configured intent set.
    pub fn intent_entries(&self) -> Vec<(String, NodeId)> {
        let mut found = Vec::new();
        if let Some(root) = self.root() {
            if let AstNode::Mapping { entries, .. } = self.arena.get(root) {
                for entry in entries {
                    if self.opts.is_intent_key(&entry.key) {
                        found.push((entry.key.clone(), entry.value));
                    }
                }
            }
        }
        found
    }

    /// Clear tokens, tree, stack, events, diagnostics, and the
    /// emitted-intent set.
    pub fn reset(&mut self) {
        self.tokenizer.reset();
        self.arena.clear();
        self.stack.clear();
        self.queue.clear();
        self.events.clear();
        self.diagnostics.clear();
        self.emitted_intents.clear();
        self.finished = false;
    }

    // ------------------------------------------------------------------
    // Token pumping
    // ------------------------------------------------------------------

    fn pump(&mut self) {
        while let Some(token) = self.tokenizer.next() {
            self.queue.push_back(token);
        }
        self.process_queue();
        self.diagnostics
            .append(&mut self.tokenizer.take_diagnostics());
    }

    fn process_queue(&mut self) {
        loop {
            let kind = match self.queue.front() {
                Some(t) => t.kind,
                None => break,
            };
            if !self.lookahead_ready(kind) {
                break;
            }
            let token = self.queue.pop_front().unwrap();
            trace!("dispatch {:?} at {}", token.kind, token.pos);
            self.dispatch(token);
        }
    }

    /// Whether the front token's lookahead requirement is satisfied.
    fn lookahead_ready(&self, kind: TokenKind) -> bool {
        if self.tokenizer.is_finishing() {
            return true;
        }
        match kind {
            TokenKind::Indent | TokenKind::Newline => self.queue.len() >= 2,
            TokenKind::Dash => self
                .queue
                .iter()
                .skip(1)
                .any(|t| Self::is_decision_token(t.kind)),
            _ => true,
        }
    }

    /// Tokens that decide what a dash item contains.
    fn is_decision_token(kind: TokenKind) -> bool {
        !matches!(
            kind,
            TokenKind::Newline | TokenKind::Comment | TokenKind::Indent
        )
    }

    fn dispatch(&mut self, token: Token) {
        match token.kind {
            TokenKind::Key => self.handle_key(token),
            // The Key → Colon → value sequencing is implicit in the grammar.
            TokenKind::Colon => {}
            TokenKind::Scalar => self.handle_value(token, false),
            TokenKind::Quoted => self.handle_value(token, true),
            TokenKind::Dash => self.handle_dash(token),
            TokenKind::Indent => self.handle_indent(token),
            TokenKind::Dedent => self.handle_dedent(token),
            TokenKind::Newline => self.handle_newline(token),
            TokenKind::Comment => self.events.push(ParseEvent::Line {
                text: token.text,
                pos: token.pos,
            }),
            TokenKind::Eof => self.handle_eof(token),
        }
    }

    // ------------------------------------------------------------------
    // Token handlers
    // ------------------------------------------------------------------

    fn handle_key(&mut self, token: Token) {
        self.ensure_root(FrameKind::Mapping, token.pos);
        self.events.push(ParseEvent::Key {
            name: token.text.clone(),
            pos: token.pos,
        });

        // A key inside a sequence starts a map-in-sequence item.
        if self.stack.last().map(|f| f.kind) == Some(FrameKind::Sequence) {
            let node = self.arena.alloc(AstNode::Mapping {
                entries: Vec::new(),
                pos: token.pos,
            });
            let seq = self.stack.last().unwrap().node;
            self.arena.push_item(seq, node);
            self.events.push(ParseEvent::BlockStart {
                kind: BlockKind::Mapping,
                pos: token.pos,
            });
            self.stack.push(Frame {
                kind: FrameKind::Mapping,
                node,
                indent: token.indent,
                pending_key: None,
            });
        }

        self.flush_pending_top();
        if let Some(top) = self.stack.last_mut() {
            top.pending_key = Some(PendingKey {
                name: token.text,
                pos: token.pos,
            });
        }
    }

    fn handle_value(&mut self, token: Token, quoted: bool) {
        self.ensure_root(FrameKind::Mapping, token.pos);
        self.events.push(ParseEvent::Value {
            text: token.text.clone(),
            quoted,
            pos: token.pos,
        });

        let scalar = self.arena.alloc(AstNode::Scalar {
            value: token.text,
            quoted,
            pos: token.pos,
        });
        let top = self.stack.last_mut().unwrap();
        match top.kind {
            FrameKind::Mapping => match top.pending_key.take() {
                Some(pending) => {
                    self.arena
                        .push_entry(top.node, pending.name, scalar, pending.pos);
                }
                None => {
                    self.diagnostics
                        .push(Diagnostic::error("value without a key", token.pos));
                }
            },
            FrameKind::Sequence => {
                self.arena.push_item(top.node, scalar);
            }
        }
    }

    fn handle_dash(&mut self, token: Token) {
        if self.stack.is_empty() {
            // A leading dash at level zero makes the whole document a
            // sequence.
            let kind = if token.indent == 0 {
                FrameKind::Sequence
            } else {
                FrameKind::Mapping
            };
            self.ensure_root(kind, token.pos);
        }

        self.pop_frames_above(token.indent, token.pos);

        if self.stack.last().unwrap().kind == FrameKind::Mapping {
            let top = self.stack.last_mut().unwrap();
            match top.pending_key.take() {
                Some(pending) => {
                    let seq = self.arena.alloc(AstNode::Sequence {
                        items: Vec::new(),
                        pos: token.pos,
                    });
                    self.arena
                        .push_entry(top.node, pending.name, seq, pending.pos);
                    self.events.push(ParseEvent::BlockStart {
                        kind: BlockKind::Sequence,
                        pos: token.pos,
                    });
                    self.stack.push(Frame {
                        kind: FrameKind::Sequence,
                        node: seq,
                        indent: token.indent,
                        pending_key: None,
                    });
                }
                None => {
                    self.diagnostics
                        .push(Diagnostic::error("sequence item without a key", token.pos));
                    return;
                }
            }
        }

        self.events.push(ParseEvent::BlockStart {
            kind: BlockKind::SequenceItem,
            pos: token.pos,
        });

        // The next decision token tells what frame the item needs: a key
        // means a map item, another dash a nested list, a scalar none.
        let next = self
            .queue
            .iter()
            .find(|t| Self::is_decision_token(t.kind))
            .map(|t| t.kind);
        let seq = self.stack.last().unwrap().node;
        match next {
            Some(TokenKind::Key) => {
                let node = self.arena.alloc(AstNode::Mapping {
                    entries: Vec::new(),
                    pos: token.pos,
                });
                self.arena.push_item(seq, node);
                self.events.push(ParseEvent::BlockStart {
                    kind: BlockKind::Mapping,
                    pos: token.pos,
                });
                self.stack.push(Frame {
                    kind: FrameKind::Mapping,
                    node,
                    indent: token.indent + 1,
                    pending_key: None,
                });
            }
            Some(TokenKind::Dash) => {
                let node = self.arena.alloc(AstNode::Sequence {
                    items: Vec::new(),
                    pos: token.pos,
                });
                self.arena.push_item(seq, node);
                self.events.push(ParseEvent::BlockStart {
                    kind: BlockKind::Sequence,
                    pos: token.pos,
                });
                self.stack.push(Frame {
                    kind: FrameKind::Sequence,
                    node,
                    indent: token.indent + 1,
                    pending_key: None,
                });
            }
            // A scalar lands directly in the sequence; dedent or eof means
            // the item never materialises.
            _ => {}
        }
    }

    fn handle_indent(&mut self, token: Token) {
        self.events.push(ParseEvent::Indent {
            level: token.indent,
            pos: token.pos,
        });

        let next_is_dash = self.queue.front().map(|t| t.kind) == Some(TokenKind::Dash);
        if next_is_dash {
            // The dash creates the sequence for the pending key itself.
            return;
        }

        let top = match self.stack.last_mut() {
            Some(top) => top,
            None => return,
        };
        if let Some(pending) = top.pending_key.take() {
            let node = self.arena.alloc(AstNode::Mapping {
                entries: Vec::new(),
                pos: token.pos,
            });
            self.arena
                .push_entry(top.node, pending.name, node, pending.pos);
            self.events.push(ParseEvent::BlockStart {
                kind: BlockKind::Mapping,
                pos: token.pos,
            });
            self.stack.push(Frame {
                kind: FrameKind::Mapping,
                node,
                indent: token.indent,
                pending_key: None,
            });
        }
    }

    fn handle_dedent(&mut self, token: Token) {
        self.events.push(ParseEvent::Dedent {
            level: token.indent,
            pos: token.pos,
        });
        self.pop_frames_above(token.indent, token.pos);
        self.probe_intents();
    }

    fn handle_newline(&mut self, _token: Token) {
        let next = self.queue.front().map(|t| t.kind);
        if matches!(next, Some(TokenKind::Dedent) | Some(TokenKind::Eof)) {
            self.flush_pending_top();
        }
    }

    fn handle_eof(&mut self, token: Token) {
        while self.stack.len() > 1 {
            self.flush_pending_top();
            self.stack.pop();
            self.events.push(ParseEvent::BlockEnd { pos: token.pos });
        }
        self.flush_pending_top();
        self.probe_intents();
        self.finished = true;
    }

    // ------------------------------------------------------------------
    // Frame helpers
    // ------------------------------------------------------------------

    /// Create the root frame if it does not exist yet.
    ///
    /// Root creation is deferred until the first structural token so that a
    /// leading dash can make the document a sequence.
    fn ensure_root(&mut self, kind: FrameKind, pos: Position) {
        if !self.stack.is_empty() {
            return;
        }
        let node = match kind {
            FrameKind::Mapping => self.arena.alloc(AstNode::Mapping {
                entries: Vec::new(),
                pos,
            }),
            FrameKind::Sequence => self.arena.alloc(AstNode::Sequence {
                items: Vec::new(),
                pos,
            }),
        };
        self.stack.push(Frame {
            kind,
            node,
            indent: 0,
            pending_key: None,
        });
    }

    /// Pop frames whose indent exceeds `level`, never the root frame.
    fn pop_frames_above(&mut self, level: usize, pos: Position) {
        while self.stack.len() > 1 && self.stack.last().unwrap().indent > level {
            self.flush_pending_top();
            self.stack.pop();
            self.events.push(ParseEvent::BlockEnd { pos });
        }
    }

    /// Flush the top frame's pending key as an `Empty` mapping placeholder.
    fn flush_pending_top(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            if let Some(pending) = top.pending_key.take() {
                let empty = self.arena.alloc(AstNode::Empty {
                    hint: EmptyHint::Mapping,
                    pos: pending.pos,
                });
                self.arena
                    .push_entry(top.node, pending.name, empty, pending.pos);
            }
        }
    }

    // ------------------------------------------------------------------
    // Intent detection
    // ------------------------------------------------------------------

    /// Emit `IntentReady` for every intent subtree whose `type`
    /// discriminator is known, at most once per node identity.
    fn probe_intents(&mut self) {
        let root = match self.stack.first() {
            Some(frame) => frame.node,
            None => return,
        };
        let candidates: Vec<NodeId> = match self.arena.get(root) {
            AstNode::Mapping { entries, .. } => entries
                .iter()
                .filter(|e| self.opts.is_intent_key(&e.key))
                .map(|e| e.value)
                .collect(),
            _ => return,
        };
        for candidate in candidates {
            match self.arena.get(candidate) {
                AstNode::Mapping { .. } => self.probe_intent_node(candidate),
                AstNode::Sequence { items, .. } => {
                    for item in items.clone() {
                        if matches!(self.arena.get(item), AstNode::Mapping { .. }) {
                            self.probe_intent_node(item);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn probe_intent_node(&mut self, node: NodeId) {
        if self.emitted_intents.contains(&node) {
            return;
        }
        let (intent_type, pos) = match self.arena.get(node) {
            AstNode::Mapping { entries, pos } => {
                let discriminator = entries
                    .iter()
                    .rev()
                    .find(|e| e.key == "type")
                    .and_then(|e| self.arena.get(e.value).scalar_text());
                match discriminator {
                    Some(text) => (text.to_string(), *pos),
                    None => return,
                }
            }
            _ => return,
        };
        self.emitted_intents.insert(node);
        self.events.push(ParseEvent::IntentReady {
            intent_type,
            node,
            pos,
        });
    }
}
