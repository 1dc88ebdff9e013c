//! Streaming facade over the rill parser and IR builder.
//!
//! [`StreamParser`] is the main entry point: feed it chunks of model output
//! with [`StreamParser::write`], inspect the partial document at any time
//! with [`StreamParser::peek`], and close the stream with
//! [`StreamParser::end`]. Structural events and intent callbacks fire
//! synchronously inside the `write`/`end` call that produced them, in
//! registration order.
//!
//! A single instance is owned by one logical producer; it is not
//! thread-safe, and none of its state is shared across instances.

pub mod preprocess;

use std::time::{Duration, Instant};

use rill_ir::{IrBuild, IrDiagnostic, Value};
use rill_parse::{Diagnostic, EventKind, Options, ParseEvent, Parser, Severity};

pub use preprocess::extract_payload;
pub use rill_ir::build as build_ir;
pub use rill_parse::{BlockKind, NodeId, Position, Token, TokenKind};

type EventHandler = Box<dyn FnMut(&ParseEvent)>;
type IntentHandler = Box<dyn FnMut(&str, &Value)>;

/// Which handler table a [`ListenerId`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Event(EventKind),
    IntentReady,
    IntentPartial,
}

/// Handle returned by the `on*` registration methods.
///
/// Closures have no identity of their own, so deregistration takes the
/// handle instead of the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId {
    slot: Slot,
    token: u64,
}

struct PartialWatcher {
    token: u64,
    handler: IntentHandler,
    debounce: Option<Duration>,
    last_emit: Option<Instant>,
    dirty: bool,
}

/// Combined diagnostics from a validate-only parse.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Tokenizer and parser diagnostics.
    pub parse: Vec<Diagnostic>,
    /// IR-build diagnostics.
    pub ir: Vec<IrDiagnostic>,
}

/// Streaming parser facade: `write` / `peek` / `end` / `reset` plus event
/// and intent subscriptions.
pub struct StreamParser {
    parser: Parser,
    listeners: [Vec<(u64, EventHandler)>; EventKind::COUNT],
    intent_handlers: Vec<(u64, IntentHandler)>,
    partial_watchers: Vec<PartialWatcher>,
    next_token: u64,
}

impl StreamParser {
    /// Create a stream parser with the given options.
    pub fn new(opts: Options) -> Self {
        Self {
            parser: Parser::new(opts),
            listeners: std::array::from_fn(|_| Vec::new()),
            intent_handlers: Vec::new(),
            partial_watchers: Vec::new(),
            next_token: 0,
        }
    }

    /// Feed a chunk. All events the chunk completes are dispatched before
    /// this returns.
    pub fn write(&mut self, chunk: &str) {
        self.parser.write(chunk);
        self.pump();
    }

    /// Build an IR snapshot of the current partial document.
    ///
    /// Never changes parser or tokenizer state; calling it repeatedly
    /// between writes returns deep-equal values.
    pub fn peek(&self) -> IrBuild {
        rill_ir::build(self.parser.arena(), self.parser.root())
    }

    /// Finalize the stream and return the final IR.
    ///
    /// Terminal events (including the last `intent_ready`) fire before this
    /// returns, and the returned IR reflects the post-emit state.
    pub fn end(&mut self) -> IrBuild {
        self.parser.finish();
        self.pump();
        self.notify_partials(true);
        self.peek()
    }

    /// Reset parser and tokenizer state, dropping the emitted-intent set
    /// but keeping every registered listener.
    pub fn reset(&mut self) {
        self.parser.reset();
        for watcher in &mut self.partial_watchers {
            watcher.last_emit = None;
            watcher.dirty = false;
        }
    }

    /// Parse diagnostics recorded so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.parser.diagnostics()
    }

    /// The configured options.
    pub fn options(&self) -> &Options {
        self.parser.options()
    }

    /// Subscribe to an event kind. Handlers run in registration order;
    /// events emitted before registration are lost.
    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&ParseEvent) + 'static) -> ListenerId {
        let token = self.bump_token();
        self.listeners[kind.index()].push((token, Box::new(handler)));
        ListenerId {
            slot: Slot::Event(kind),
            token,
        }
    }

    /// Remove a previously registered handler. Returns whether it existed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        match id.slot {
            Slot::Event(kind) => {
                let list = &mut self.listeners[kind.index()];
                let before = list.len();
                list.retain(|(token, _)| *token != id.token);
                list.len() != before
            }
            Slot::IntentReady => {
                let before = self.intent_handlers.len();
                self.intent_handlers.retain(|(token, _)| *token != id.token);
                self.intent_handlers.len() != before
            }
            Slot::IntentPartial => {
                let before = self.partial_watchers.len();
                self.partial_watchers.retain(|w| w.token != id.token);
                self.partial_watchers.len() != before
            }
        }
    }

    /// Subscribe to completed intents. The handler receives the intent's
    /// `type` discriminator and the IR build of its subtree.
    pub fn on_intent_ready(
        &mut self,
        handler: impl FnMut(&str, &Value) + 'static,
    ) -> ListenerId {
        let token = self.bump_token();
        self.intent_handlers.push((token, Box::new(handler)));
        ListenerId {
            slot: Slot::IntentReady,
            token,
        }
    }

    /// Subscribe to partial intent snapshots.
    ///
    /// After every `value` and `block_end`, the root mapping's intent
    /// entries are rebuilt and handed to the handler keyed by the matched
    /// intent key. With a debounce, bursts inside the window coalesce into
    /// one trailing emission at the next trigger outside it (or at `end`);
    /// there is no background timer.
    pub fn on_intent_partial(
        &mut self,
        handler: impl FnMut(&str, &Value) + 'static,
        debounce: Option<Duration>,
    ) -> ListenerId {
        let token = self.bump_token();
        self.partial_watchers.push(PartialWatcher {
            token,
            handler: Box::new(handler),
            debounce,
            last_emit: None,
            dirty: false,
        });
        ListenerId {
            slot: Slot::IntentPartial,
            token,
        }
    }

    fn bump_token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }

    /// Drain parser events and dispatch them.
    fn pump(&mut self) {
        let events = self.parser.take_events();
        let mut partial_trigger = false;
        for event in &events {
            for (_, handler) in &mut self.listeners[event.kind().index()] {
                handler(event);
            }
            if let ParseEvent::IntentReady {
                intent_type, node, ..
            } = event
            {
                if !self.intent_handlers.is_empty() {
                    let payload = rill_ir::build(self.parser.arena(), Some(*node)).value;
                    for (_, handler) in &mut self.intent_handlers {
                        handler(intent_type, &payload);
                    }
                }
            }
            if matches!(event.kind(), EventKind::Value | EventKind::BlockEnd) {
                partial_trigger = true;
            }
        }
        if partial_trigger {
            self.notify_partials(false);
        }
    }

    /// Rebuild intent subtrees and feed the partial watchers.
    fn notify_partials(&mut self, flush: bool) {
        if self.partial_watchers.is_empty() {
            return;
        }
        let entries = self.parser.intent_entries();
        if entries.is_empty() {
            return;
        }
        let payloads: Vec<(String, Value)> = entries
            .iter()
            .map(|(key, node)| {
                (
                    key.clone(),
                    rill_ir::build(self.parser.arena(), Some(*node)).value,
                )
            })
            .collect();

        let now = Instant::now();
        for watcher in &mut self.partial_watchers {
            let due = match (watcher.debounce, watcher.last_emit) {
                (None, _) | (Some(_), None) => true,
                (Some(window), Some(last)) => now.duration_since(last) >= window,
            };
            let emit = if flush { watcher.dirty } else { due };
            if emit {
                for (key, payload) in &payloads {
                    (watcher.handler)(key, payload);
                }
                watcher.last_emit = Some(now);
                watcher.dirty = false;
            } else if !flush {
                watcher.dirty = true;
            }
        }
    }
}

/// Parse a complete document with default options.
pub fn parse_str(source: &str) -> IrBuild {
    parse_with(source, Options::default()).0
}

/// Parse a complete document, returning the IR and the parse diagnostics.
pub fn parse_with(source: &str, opts: Options) -> (IrBuild, Vec<Diagnostic>) {
    let mut stream = StreamParser::new(opts);
    stream.write(source);
    let build = stream.end();
    (build, stream.diagnostics().to_vec())
}

/// Validate a complete document.
///
/// Under `strict`, warnings are promoted to errors. Returns `Ok` when no
/// error-severity diagnostic remains.
pub fn validate(source: &str, opts: &Options) -> Result<(), ValidationReport> {
    let (build, mut parse_diags) = parse_with(source, opts.clone());
    let mut ir_diags = build.errors;

    if opts.strict {
        for diag in &mut parse_diags {
            if diag.severity >= Severity::Warning {
                diag.severity = Severity::Error;
            }
        }
        for diag in &mut ir_diags {
            if diag.severity >= Severity::Warning {
                diag.severity = Severity::Error;
            }
        }
    }

    let has_errors = parse_diags.iter().any(|d| d.severity == Severity::Error)
        || ir_diags.iter().any(|d| d.severity == Severity::Error);
    if has_errors {
        Err(ValidationReport {
            parse: parse_diags,
            ir: ir_diags,
        })
    } else {
        Ok(())
    }
}
