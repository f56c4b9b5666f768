//! Host frame loop: steps the sandbox world on its own thread.
//!
//! Commands arrive over an `mpsc` channel and are applied between frames.
//! Each frame advances the world by `step_secs`; frames are paced so the
//! world runs at `time_scale` times wall-clock speed.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use wta_core::types::{PlatformId, TargetId};
use wta_sandbox::SandboxWorld;

/// Commands for the host loop thread.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    KillUnit(PlatformId),
    KillTarget(TargetId),
    DamageUnit(PlatformId, f64),
    /// Stop the loop after the current frame.
    Shutdown,
}

pub struct HostLoop {
    tx: mpsc::Sender<HostCommand>,
    handle: Option<JoinHandle<u64>>,
}

impl HostLoop {
    /// Spawn the loop thread.
    pub fn spawn(world: Arc<SandboxWorld>, time_scale: f64) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let step_secs = world.config().step_secs;
        let frame = Duration::from_secs_f64(step_secs / time_scale.max(1e-3));
        let handle = std::thread::Builder::new()
            .name("wta-host-loop".into())
            .spawn(move || run_host_loop(&world, &rx, step_secs, frame))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    /// Queue a command. False once the loop has exited.
    pub fn send(&self, command: HostCommand) -> bool {
        self.tx.send(command).is_ok()
    }

    /// Stop the loop and return how many frames it ran.
    pub fn shutdown(&mut self) -> u64 {
        let _ = self.tx.send(HostCommand::Shutdown);
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(frames)) => frames,
            Some(Err(_)) => {
                tracing::error!("host loop panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply one command. Returns false on shutdown.
fn apply(world: &SandboxWorld, command: HostCommand) -> bool {
    match command {
        HostCommand::KillUnit(id) => {
            world.kill_unit(id);
        }
        HostCommand::KillTarget(id) => {
            world.kill_target(id);
        }
        HostCommand::DamageUnit(id, amount) => {
            world.damage_unit(id, amount);
        }
        HostCommand::Shutdown => return false,
    }
    true
}

fn run_host_loop(
    world: &SandboxWorld,
    rx: &mpsc::Receiver<HostCommand>,
    step_secs: f64,
    frame: Duration,
) -> u64 {
    let mut frames = 0;
    let mut next_frame = Instant::now();

    loop {
        loop {
            match rx.try_recv() {
                Ok(command) => {
                    if !apply(world, command) {
                        return frames;
                    }
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return frames,
            }
        }

        world.step(step_secs);
        frames += 1;

        next_frame += frame;
        let now = Instant::now();
        if next_frame > now {
            std::thread::sleep(next_frame - now);
        } else if now - next_frame > frame * 2 {
            // Too far behind: drop the backlog instead of racing to catch up.
            next_frame = now;
        }
    }
}
