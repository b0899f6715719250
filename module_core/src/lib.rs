// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Single worker command queue.
//!
//! Every module owns one [`ModuleCtx`] and drains it from one task, so the
//! module state is only ever touched by that task. Other tasks and threads
//! talk to the module by sending commands through a [`CommandSender`].

use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::debug;

/// A command type a module loop can be stopped with.
pub trait QueueCommand: Send + 'static {
    /// Returns the command that ends the module loop.
    fn quit() -> Self;
}

/// The module that owned the queue has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("command queue is closed")]
pub struct QueueClosed;

/// Cloneable producer side of a command queue.
///
/// Sending never blocks, so it may be used from engine threads, timer tasks
/// and blocking pool workers alike.
pub struct CommandSender<C> {
    sender: UnboundedSender<C>,
}

impl<C> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        CommandSender {
            sender: self.sender.clone(),
        }
    }
}

impl<C> std::fmt::Debug for CommandSender<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSender")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<C> CommandSender<C> {
    /// Enqueues a command behind every command sent before it.
    ///
    /// # Errors
    ///
    /// * [`QueueClosed`] - The receiving module has stopped.
    pub fn send(&self, command: C) -> Result<(), QueueClosed> {
        self.sender.send(command).map_err(|_| {
            debug!("Dropping command, queue is closed");
            QueueClosed
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// An ordered, unbounded command queue for one module.
pub struct CommandQueue<C> {
    sender: UnboundedSender<C>,
    receiver: UnboundedReceiver<C>,
}

impl<C> CommandQueue<C> {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded_channel();
        CommandQueue { sender, receiver }
    }

    /// Returns a new producer for this queue.
    pub fn sender(&self) -> CommandSender<C> {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Turns the queue into the context of the module that drains it.
    pub fn context(self) -> ModuleCtx<C> {
        ModuleCtx {
            sender: CommandSender {
                sender: self.sender,
            },
            receiver: self.receiver,
        }
    }
}

impl<C> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Defines the common interface for an asynchronous module that drains a
/// command queue.
#[async_trait::async_trait]
pub trait Module {
    /// Runs the module until it receives its quit command.
    async fn run(&mut self) -> Result<(), ()>;
}

/// Context of a running module.
pub struct ModuleCtx<C> {
    /// Sender of the module's own queue, used to post follow up commands.
    pub sender: CommandSender<C>,

    /// Receiver the module loop drains.
    pub receiver: UnboundedReceiver<C>,
}

impl<C> ModuleCtx<C> {
    /// Waits for the next command. Returns `None` once all senders are gone.
    pub async fn next(&mut self) -> Option<C> {
        self.receiver.recv().await
    }
}

pub mod test_helper;
