//! Concurrent check execution.
//!
//! Every generate step and every slot check becomes one task on a tokio
//! runtime. Tasks compete for a fixed number of semaphore permits and return
//! their result keyed by the (group, tile, slot) position they own, so the
//! collector fills a preallocated tree without locking.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::evaluator::{evaluate, fallback_status};
use super::events::{emit, EventSink, RunEvent};
use super::model::{Dashboard, Generate, Slot};
use super::probes::{run_shell, Probe};
use super::results::{DashboardResult, GenerateOutcome, GroupResult, SlotResult, TileResult};
use crate::error::{BoardError, Result};

/// Upper bound for the automatically chosen pool size.
pub const MAX_AUTO_CONCURRENCY: usize = 16;

/// Whether a tile's generate step gates its own slot checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerateOrdering {
    /// Generate and slot checks run independently.
    #[default]
    Concurrent,
    /// Slot checks of a tile start only after its generate step finished.
    BeforeSlots,
}

/// Runner configuration.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Pool size; 0 picks the available parallelism clamped to [1, 16].
    pub concurrency: usize,
    pub ordering: GenerateOrdering,
    /// Cancel the whole run after this long.
    pub deadline: Option<Duration>,
    /// Receives lifecycle events in verbose mode.
    pub sink: Option<Arc<dyn EventSink>>,
    /// Shared HTTP client; a default one is built when absent.
    pub http_client: Option<reqwest::Client>,
}

/// Pool size actually used for a requested concurrency.
pub fn effective_concurrency(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_AUTO_CONCURRENCY)
}

#[derive(Debug, Clone, Copy)]
struct SlotKey {
    group: usize,
    tile: usize,
    slot: usize,
}

enum TaskOutcome {
    Slot(SlotKey, SlotResult),
    Generate {
        group: usize,
        tile: usize,
        outcome: GenerateOutcome,
    },
}

/// Executes all checks of a dashboard.
pub struct Runner {
    options: RunOptions,
}

impl Runner {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    /// Execute every generate step and slot check and return the resolved tree.
    ///
    /// Individual probe or generate failures never fail the run; only a
    /// dashboard without groups is rejected.
    pub async fn run(
        &self,
        dashboard: &Dashboard,
        cancel: CancellationToken,
    ) -> Result<DashboardResult> {
        if dashboard.groups.is_empty() {
            return Err(BoardError::config("at least one group is required"));
        }

        let workers = effective_concurrency(self.options.concurrency);
        let semaphore = Arc::new(Semaphore::new(workers));
        let client = match &self.options.http_client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder().build()?,
        };

        let cancel = cancel.child_token();
        let deadline = self.options.deadline.map(|limit| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                log::debug!("run deadline of {:?} reached, cancelling", limit);
                token.cancel();
            })
        });

        log::debug!(
            "running {} checks across {} tiles with {} workers",
            dashboard.slot_count(),
            dashboard.tile_count(),
            workers
        );

        let mut tasks = JoinSet::new();

        for (gi, group) in dashboard.groups.iter().enumerate() {
            for (ti, tile) in group.tiles.iter().enumerate() {
                let gate = match &tile.generate {
                    Some(generate) => {
                        let (done_tx, done_rx) = watch::channel(false);
                        let generate = generate.clone();
                        let tile_name = tile.name.clone();
                        let semaphore = semaphore.clone();
                        let sink = self.options.sink.clone();
                        let cancel = cancel.clone();

                        tasks.spawn(async move {
                            let _permit = acquire(semaphore, &cancel).await;
                            let outcome =
                                run_generate(&tile_name, &generate, sink.as_deref(), &cancel).await;
                            let _ = done_tx.send(true);
                            TaskOutcome::Generate {
                                group: gi,
                                tile: ti,
                                outcome,
                            }
                        });

                        match self.options.ordering {
                            GenerateOrdering::BeforeSlots => Some(done_rx),
                            GenerateOrdering::Concurrent => None,
                        }
                    }
                    None => None,
                };

                for (si, slot) in tile.slots.iter().enumerate() {
                    let key = SlotKey {
                        group: gi,
                        tile: ti,
                        slot: si,
                    };
                    let slot = slot.clone();
                    let tile_name = tile.name.clone();
                    let semaphore = semaphore.clone();
                    let sink = self.options.sink.clone();
                    let client = client.clone();
                    let cancel = cancel.clone();
                    let mut gate = gate.clone();

                    tasks.spawn(async move {
                        // Wait without holding a permit so the generate step can get one.
                        if let Some(gate) = gate.as_mut() {
                            let _ = gate.wait_for(|done| *done).await;
                        }
                        let _permit = acquire(semaphore, &cancel).await;
                        let result =
                            run_slot(&tile_name, &slot, client, sink.as_deref(), &cancel).await;
                        TaskOutcome::Slot(key, result)
                    });
                }
            }
        }

        let mut slots: Vec<Vec<Vec<Option<SlotResult>>>> = dashboard
            .groups
            .iter()
            .map(|g| g.tiles.iter().map(|t| vec![None; t.slots.len()]).collect())
            .collect();
        let mut generates: Vec<Vec<Option<GenerateOutcome>>> = dashboard
            .groups
            .iter()
            .map(|g| vec![None; g.tiles.len()])
            .collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(TaskOutcome::Slot(key, result)) => {
                    slots[key.group][key.tile][key.slot] = Some(result);
                }
                Ok(TaskOutcome::Generate {
                    group,
                    tile,
                    outcome,
                }) => {
                    generates[group][tile] = Some(outcome);
                }
                Err(e) => log::error!("check task failed: {}", e),
            }
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        let mut result = DashboardResult::header(dashboard);
        for ((group, group_slots), group_generates) in
            dashboard.groups.iter().zip(slots).zip(generates)
        {
            let tiles = group
                .tiles
                .iter()
                .zip(group_slots)
                .zip(group_generates)
                .map(|((tile, tile_slots), generate)| TileResult {
                    name: tile.name.clone(),
                    icon: tile.icon.clone(),
                    link: tile.link.clone(),
                    banner: tile.banner.clone(),
                    generate: match (&tile.generate, generate) {
                        (None, _) => None,
                        (Some(_), Some(outcome)) => Some(outcome),
                        (Some(_), None) => Some(GenerateOutcome::Failed {
                            error: "generate task aborted".to_string(),
                        }),
                    },
                    slots: tile
                        .slots
                        .iter()
                        .zip(tile_slots)
                        .map(|(slot, resolved)| {
                            resolved.unwrap_or_else(|| {
                                let status = fallback_status(slot.default_status.as_ref());
                                emit(
                                    self.options.sink.as_deref(),
                                    RunEvent::Resolved {
                                        tile: tile.name.clone(),
                                        slot: slot.name.clone(),
                                        status: status.clone(),
                                    },
                                );
                                SlotResult {
                                    name: slot.name.clone(),
                                    status,
                                    output: String::new(),
                                }
                            })
                        })
                        .collect(),
                })
                .collect();

            result.groups.push(GroupResult {
                name: group.name.clone(),
                tiles,
            });
        }

        Ok(result)
    }
}

/// Wait for a pool permit, giving up once the run is cancelled.
///
/// A cancelled task still runs its probe, which then reports the
/// cancellation as an execution error right away.
async fn acquire(
    semaphore: Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        permit = semaphore.acquire_owned() => permit.ok(),
        _ = cancel.cancelled() => None,
    }
}

async fn run_generate(
    tile: &str,
    generate: &Generate,
    sink: Option<&dyn EventSink>,
    cancel: &CancellationToken,
) -> GenerateOutcome {
    emit(
        sink,
        RunEvent::GenerateStarted {
            tile: tile.to_string(),
            command: generate.command.clone(),
        },
    );

    let outcome = match run_shell(&generate.command, generate.effective_timeout(), cancel).await {
        Ok(out) if out.exit_code == 0 => GenerateOutcome::Ok,
        Ok(out) => GenerateOutcome::Failed {
            error: format!(
                "command {:?}: exit status {} (output: {})",
                generate.command,
                out.exit_code,
                out.combined()
            ),
        },
        Err(e) => GenerateOutcome::Failed {
            error: format!("command {:?}: {}", generate.command, e),
        },
    };

    if let GenerateOutcome::Failed { error } = &outcome {
        emit(
            sink,
            RunEvent::GenerateFailed {
                tile: tile.to_string(),
                error: error.clone(),
            },
        );
    }

    outcome
}

async fn run_slot(
    tile: &str,
    slot: &Slot,
    client: reqwest::Client,
    sink: Option<&dyn EventSink>,
    cancel: &CancellationToken,
) -> SlotResult {
    emit(
        sink,
        RunEvent::CheckStarted {
            tile: tile.to_string(),
            slot: slot.name.clone(),
            kind: slot.check.kind.clone(),
            target: slot.check.target.clone(),
        },
    );

    let (status, output) = match Probe::from_check(&slot.check) {
        Ok(probe) => {
            let result = probe.with_http_client(client).check(cancel).await;
            if let Some(error) = &result.error {
                emit(
                    sink,
                    RunEvent::CheckError {
                        tile: tile.to_string(),
                        slot: slot.name.clone(),
                        error: error.to_string(),
                    },
                );
            }
            let status = evaluate(&result, &slot.rules, slot.default_status.as_ref());
            (status, result.output)
        }
        Err(e) => {
            log::error!("{}/{}: {}", tile, slot.name, e);
            emit(
                sink,
                RunEvent::CheckError {
                    tile: tile.to_string(),
                    slot: slot.name.clone(),
                    error: e.to_string(),
                },
            );
            (fallback_status(slot.default_status.as_ref()), String::new())
        }
    };

    emit(
        sink,
        RunEvent::Resolved {
            tile: tile.to_string(),
            slot: slot.name.clone(),
            status: status.clone(),
        },
    );

    SlotResult {
        name: slot.name.clone(),
        status,
        output,
    }
}
