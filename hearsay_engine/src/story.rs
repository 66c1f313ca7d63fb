//! The driver-facing runner.
//!
//! A [`Story`] owns a validated [`Script`] and a stack of frames, one per block
//! being run. The driver calls [`Story::start`] and then whichever of
//! [`Story::resume`], [`Story::update`] or [`Story::choose`] ends the current
//! suspension. Every call runs nodes until the next suspension and returns it.
//!
//! `jump` replaces the top frame. Picking a choice pushes the option's block, so
//! when that block ends (or hits `return`) the story carries on after `choose`.
//! An empty stack means the story is finished.
//!
//! After an error the story stops; call `start` to run it again.

use hearsay_data::{Bindings, ClearKind, MAIN, Node, Scope, Script, Value, validate_script};
use log::{debug, info, warn};

use crate::config::StoryConfig;
use crate::error::StoryError;
use crate::execute::{Flow, dispatch_node};
use crate::presentation::Presentation;
use crate::signal::Yield;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    block: String,
    next: usize,
}

impl Frame {
    fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            next: 0,
        }
    }
}

#[derive(Debug)]
pub struct Story {
    script: Script,
    scope: Scope,
    bindings: Bindings,
    config: StoryConfig,
    stack: Vec<Frame>,
    status: Yield,
    remaining: f64,
}

impl Story {
    /// Wraps a compiled script with default settings.
    ///
    /// # Errors
    /// [`StoryError::Invalid`] if a jump or choice names a block the script lacks.
    pub fn new(script: Script, bindings: Bindings) -> Result<Self, StoryError> {
        Self::with_config(script, bindings, StoryConfig::default())
    }

    /// A `max_steps` of zero is raised to one.
    ///
    /// # Errors
    /// [`StoryError::Invalid`] if a jump or choice names a block the script lacks.
    pub fn with_config(script: Script, bindings: Bindings, mut config: StoryConfig) -> Result<Self, StoryError> {
        let problems = validate_script(&script);
        if !problems.is_empty() {
            return Err(StoryError::Invalid(problems));
        }
        if config.max_steps == 0 {
            warn!("max_steps of 0 would stop every story; using 1");
            config.max_steps = 1;
        }
        Ok(Self {
            script,
            scope: Scope::new(),
            bindings,
            config,
            stack: Vec::new(),
            status: Yield::Finished,
            remaining: 0.0,
        })
    }

    /// Runs from the top of the main block. A script without one finishes at once.
    ///
    /// # Errors
    /// Any error raised while running up to the first suspension.
    pub fn start(&mut self, view: &mut Presentation) -> Result<Yield, StoryError> {
        if !self.script.contains(MAIN) {
            info!("story has no main block; nothing to run");
            self.stop();
            return Ok(self.status);
        }
        self.start_at(MAIN, view)
    }

    /// Runs from the top of `block`, discarding wherever the story was.
    ///
    /// # Errors
    /// [`StoryError::UnknownBlock`] if there is no such block, or any error raised
    /// while running.
    pub fn start_at(&mut self, block: &str, view: &mut Presentation) -> Result<Yield, StoryError> {
        if !self.script.contains(block) {
            return Err(StoryError::UnknownBlock(block.to_string()));
        }
        info!("starting story at block '{block}'");
        self.stack = vec![Frame::new(block)];
        self.remaining = 0.0;
        self.status = Yield::Advance;
        self.run(view)
    }

    /// Runs on if nothing is holding the story, otherwise reports the current status.
    ///
    /// # Errors
    /// Any error raised while running.
    pub fn advance(&mut self, view: &mut Presentation) -> Result<Yield, StoryError> {
        match self.status {
            Yield::Advance => self.run(view),
            status => Ok(status),
        }
    }

    /// Ends a `wait`, or cuts a `pause` short.
    ///
    /// # Errors
    /// [`StoryError::AwaitingChoice`] while a choice is pending, or any error raised
    /// while running.
    pub fn resume(&mut self, view: &mut Presentation) -> Result<Yield, StoryError> {
        match self.status {
            Yield::AwaitResume | Yield::AwaitDuration(_) => {
                self.remaining = 0.0;
                self.status = Yield::Advance;
                self.run(view)
            },
            Yield::AwaitChoice => Err(StoryError::AwaitingChoice),
            status => Ok(status),
        }
    }

    /// Counts `elapsed` seconds off a pending `pause`, running on once it has run out.
    /// Other suspensions are left alone.
    ///
    /// # Errors
    /// Any error raised while running.
    pub fn update(&mut self, elapsed: f64, view: &mut Presentation) -> Result<Yield, StoryError> {
        if !self.status.is_await_duration() {
            return Ok(self.status);
        }
        self.remaining -= elapsed;
        if self.remaining > 0.0 {
            self.status = Yield::AwaitDuration(self.remaining);
            return Ok(self.status);
        }
        self.remaining = 0.0;
        self.status = Yield::Advance;
        self.run(view)
    }

    /// Picks an open choice and runs its block.
    ///
    /// # Errors
    /// - [`StoryError::NotAwaitingChoice`] unless the story is held at `choose`
    /// - [`StoryError::UnknownChoice`] if `id` is not on offer
    /// - any error raised while running
    pub fn choose(&mut self, id: &str, view: &mut Presentation) -> Result<Yield, StoryError> {
        if self.status != Yield::AwaitChoice {
            return Err(StoryError::NotAwaitingChoice);
        }
        if !view.has_choice(id) {
            return Err(StoryError::UnknownChoice(id.to_string()));
        }
        debug!("choice '{id}' picked");
        view.clear(ClearKind::Choices);
        self.stack.push(Frame::new(id));
        self.status = Yield::Advance;
        self.run(view)
    }

    fn run(&mut self, view: &mut Presentation) -> Result<Yield, StoryError> {
        let mut steps = 0;
        loop {
            let Some(node) = next_node(&self.script, &mut self.stack) else {
                info!("story finished");
                self.stop();
                return Ok(self.status);
            };
            if steps == self.config.max_steps {
                break;
            }
            steps += 1;
            let outcome = match dispatch_node(node, &self.scope, &self.bindings, view) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("story stopped: {e}");
                    self.stop();
                    return Err(e);
                },
            };
            match outcome.flow {
                Flow::Next => {},
                Flow::Jump(target) => {
                    if let Some(top) = self.stack.last_mut() {
                        *top = Frame::new(target);
                    }
                },
                Flow::Return => {
                    self.stack.pop();
                },
            }
            if let Yield::AwaitDuration(seconds) = outcome.signal {
                self.remaining = seconds;
            }
            if outcome.signal != Yield::Advance {
                self.status = outcome.signal;
                return Ok(self.status);
            }
        }
        warn!("story stopped after {} nodes without suspending", self.config.max_steps);
        self.stop();
        Err(StoryError::Runaway(self.config.max_steps))
    }

    fn stop(&mut self) {
        self.stack.clear();
        self.remaining = 0.0;
        self.status = Yield::Finished;
    }

    pub fn status(&self) -> Yield {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// The block the next node will come from.
    pub fn current_block(&self) -> Option<&str> {
        self.stack.last().map(|frame| frame.block.as_str())
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// # Errors
    /// [`StoryError::Scope`] if `name` already holds a value of another category.
    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) -> Result<(), StoryError> {
        self.scope.set(name, value)?;
        Ok(())
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }
}

/// The next node to run, popping frames whose blocks are used up.
fn next_node<'a>(script: &'a Script, stack: &mut Vec<Frame>) -> Option<&'a Node> {
    while let Some(frame) = stack.last_mut() {
        if let Some(node) = script.block(&frame.block).and_then(|nodes| nodes.get(frame.next)) {
            frame.next += 1;
            return Some(node);
        }
        stack.pop();
    }
    None
}
