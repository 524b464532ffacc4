use std::collections::HashSet;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::Utc;

use crate::archive_fetch::ArchiveClient;
use crate::state::{Delta, FetchFailure, ProviderCommand};

/// Services fetch commands on a background thread, one job thread per request.
///
/// Results come back as deltas; the session decides whether they are still wanted.
/// History fetches for a player already in flight are skipped.
pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    client: ArchiveClient,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let client = Arc::new(client);
        let inflight_histories: Arc<Mutex<HashSet<i64>>> = Arc::new(Mutex::new(HashSet::new()));

        for cmd in cmd_rx {
            match cmd {
                ProviderCommand::FetchDetails {
                    request,
                    generation,
                } => {
                    let tx = tx.clone();
                    let client = client.clone();
                    thread::spawn(move || {
                        let match_id = request.match_id;
                        let delta = match client.fetch_details_guarded(&request, Utc::now()) {
                            Ok(record) => Delta::DetailsLoaded {
                                match_id,
                                generation,
                                record,
                            },
                            Err(err) => {
                                if !err.is_locked() {
                                    let _ = tx.send(Delta::Log(format!(
                                        "[WARN] Details fetch for match {match_id}: {err}"
                                    )));
                                }
                                Delta::DetailsFailed {
                                    match_id,
                                    generation,
                                    failure: FetchFailure::from(&err),
                                }
                            }
                        };
                        let _ = tx.send(delta);
                    });
                }
                ProviderCommand::FetchHistory { player_id } => {
                    {
                        let mut inflight = inflight_histories
                            .lock()
                            .expect("inflight histories lock poisoned");
                        if !inflight.insert(player_id) {
                            continue;
                        }
                    }

                    let tx = tx.clone();
                    let client = client.clone();
                    let inflight_histories = inflight_histories.clone();
                    thread::spawn(move || {
                        let delta = match client.fetch_history(player_id) {
                            Ok(archive) => Delta::HistoryLoaded { player_id, archive },
                            Err(err) => Delta::HistoryFailed {
                                player_id,
                                message: err.user_message(),
                            },
                        };
                        let _ = tx.send(delta);
                        let mut inflight = inflight_histories
                            .lock()
                            .expect("inflight histories lock poisoned");
                        inflight.remove(&player_id);
                    });
                }
            }
        }
    })
}
