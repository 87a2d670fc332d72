use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use core_types::Source;
use html::Document;
use net::FetchError;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::fetcher::{DocumentFetcher, NetFetcher};

/// Lifecycle of one source within a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Completed,
    Failed,
    /// Never started, or unwound before storing, because the batch was cancelled.
    Skipped,
}

/// Title of a page linked from an ingested document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSummary {
    /// Document the link was found in.
    pub source: Source,
    pub url: String,
    pub title: Option<String>,
}

/// Receives every successfully followed link, in document order per source.
pub trait LinkObserver: Send + Sync {
    fn on_link(&self, link: &LinkSummary);
}

/// Logs each followed link at `info` under the `runtime_ingest` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogLinkObserver;

impl LinkObserver for LogLinkObserver {
    fn on_link(&self, link: &LinkSummary) {
        log::info!(
            target: "runtime_ingest",
            "{}: {} ({})",
            link.source,
            link.url,
            link.title.as_deref().unwrap_or("untitled")
        );
    }
}

/// Everything a batch produced.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per distinct source that was fetched and stored.
    pub documents: HashMap<Source, Document>,
    pub failures: Vec<(Source, FetchError)>,
    pub links: Vec<LinkSummary>,
    /// Final state of every submitted task, in submission order.
    pub tasks: Vec<(Source, TaskState)>,
}

impl BatchReport {
    pub fn count(&self, state: TaskState) -> usize {
        self.tasks.iter().filter(|(_, s)| *s == state).count()
    }
}

enum TaskOutcome {
    Started(usize),
    Stored(usize, Document),
    Link(LinkSummary),
    Finished(usize),
    Failed {
        index: usize,
        error: FetchError,
        aborts: bool,
    },
    Unwound(usize),
}

type JobQueue = Mutex<Receiver<(usize, Source)>>;

/// Fetches and parses batches of sources on a fixed pool of worker threads.
///
/// Each task fetches its source, stores the document under the source, then
/// follows the document's `a[href]` links one by one to report their titles.
/// Failures stay isolated to their task unless `terminate_on_error` is set and
/// a primary fetch answers with an HTTP error: that cancels the batch, which
/// then returns [`IngestError::Aborted`] once every worker has stopped.
pub struct Ingestor {
    config: IngestConfig,
    observer: Arc<dyn LinkObserver>,
}

impl Ingestor {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            observer: Arc::new(LogLinkObserver),
        }
    }

    pub fn with_link_observer(mut self, observer: Arc<dyn LinkObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn ingest<F>(
        &self,
        sources: Vec<Source>,
        fetcher: &F,
    ) -> Result<HashMap<Source, Document>, IngestError>
    where
        F: DocumentFetcher + ?Sized,
    {
        self.run_batch(sources, fetcher).map(|report| report.documents)
    }

    pub fn run_batch<F>(&self, sources: Vec<Source>, fetcher: &F) -> Result<BatchReport, IngestError>
    where
        F: DocumentFetcher + ?Sized,
    {
        let mut report = BatchReport {
            tasks: sources
                .iter()
                .map(|source| (source.clone(), TaskState::Queued))
                .collect(),
            ..BatchReport::default()
        };
        if sources.is_empty() {
            return Ok(report);
        }

        let workers = self.config.max_threads().min(sources.len());
        let (job_tx, job_rx) = mpsc::channel();
        for job in sources.into_iter().enumerate() {
            // the receiver lives until the end of this function
            let _ = job_tx.send(job);
        }
        drop(job_tx);
        let jobs: JobQueue = Mutex::new(job_rx);
        let cancel = AtomicBool::new(false);
        let mut aborted: Option<IngestError> = None;

        log::debug!(
            target: "runtime_ingest",
            "batch of {} sources on {workers} workers",
            report.tasks.len()
        );

        thread::scope(|scope| {
            let (outcome_tx, outcome_rx) = mpsc::channel();
            for worker in 0..workers {
                let outcome_tx = outcome_tx.clone();
                let (jobs, cancel) = (&jobs, &cancel);
                scope.spawn(move || self.work(worker, jobs, fetcher, cancel, outcome_tx));
            }
            drop(outcome_tx);

            // single collector: only this thread touches the report
            for outcome in outcome_rx {
                match outcome {
                    TaskOutcome::Started(index) => report.tasks[index].1 = TaskState::Running,
                    TaskOutcome::Stored(index, document) => {
                        let source = report.tasks[index].0.clone();
                        report.documents.insert(source, document);
                    }
                    TaskOutcome::Link(link) => report.links.push(link),
                    TaskOutcome::Finished(index) => report.tasks[index].1 = TaskState::Completed,
                    TaskOutcome::Failed {
                        index,
                        error,
                        aborts,
                    } => {
                        let source = report.tasks[index].0.clone();
                        report.tasks[index].1 = TaskState::Failed;
                        if aborts && aborted.is_none() {
                            aborted = Some(IngestError::Aborted {
                                target: source.clone(),
                                status: error.status().unwrap_or_default(),
                            });
                        }
                        report.failures.push((source, error));
                    }
                    TaskOutcome::Unwound(index) => report.tasks[index].1 = TaskState::Skipped,
                }
            }
        });

        for (_, state) in &mut report.tasks {
            if *state == TaskState::Queued {
                *state = TaskState::Skipped;
            }
        }

        log::debug!(
            target: "runtime_ingest",
            "batch done: {} stored, {} failed, {} skipped",
            report.documents.len(),
            report.count(TaskState::Failed),
            report.count(TaskState::Skipped)
        );

        match aborted {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    fn work<F>(
        &self,
        worker: usize,
        jobs: &JobQueue,
        fetcher: &F,
        cancel: &AtomicBool,
        outcomes: Sender<TaskOutcome>,
    ) where
        F: DocumentFetcher + ?Sized,
    {
        loop {
            if cancel.load(Ordering::Acquire) {
                log::debug!(target: "runtime_ingest", "worker {worker}: batch cancelled");
                return;
            }
            let next = jobs
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            let Ok((index, source)) = next else {
                return;
            };
            // a closed channel means the collector is gone; nothing left to report to
            if self
                .run_task(index, &source, fetcher, cancel, &outcomes)
                .is_err()
            {
                return;
            }
        }
    }

    fn run_task<F>(
        &self,
        index: usize,
        source: &Source,
        fetcher: &F,
        cancel: &AtomicBool,
        outcomes: &Sender<TaskOutcome>,
    ) -> Result<(), SendError<TaskOutcome>>
    where
        F: DocumentFetcher + ?Sized,
    {
        outcomes.send(TaskOutcome::Started(index))?;

        let document = match fetcher.fetch(source) {
            Ok(document) => document,
            Err(error) => {
                let aborts = error.is_status() && self.config.terminate_on_error();
                if aborts {
                    log::error!(target: "runtime_ingest", "{source}: {error}; cancelling batch");
                    cancel.store(true, Ordering::Release);
                } else if error.is_status() {
                    log::warn!(target: "runtime_ingest", "{source}: {error}");
                } else {
                    log::error!(target: "runtime_ingest", "{source}: {error}");
                }
                return outcomes.send(TaskOutcome::Failed {
                    index,
                    error,
                    aborts,
                });
            }
        };

        if cancel.load(Ordering::Acquire) {
            return outcomes.send(TaskOutcome::Unwound(index));
        }

        let links = if self.config.follow_links() {
            document.select_links()
        } else {
            Vec::new()
        };
        outcomes.send(TaskOutcome::Stored(index, document))?;

        for url in links {
            if cancel.load(Ordering::Acquire) {
                break;
            }
            match fetcher.fetch(&Source::Url(url.clone())) {
                Ok(linked) => {
                    let link = LinkSummary {
                        source: source.clone(),
                        url,
                        title: linked.title(),
                    };
                    self.observer.on_link(&link);
                    outcomes.send(TaskOutcome::Link(link))?;
                }
                Err(error) => log::warn!(target: "runtime_ingest", "{source}: link {url}: {error}"),
            }
        }

        outcomes.send(TaskOutcome::Finished(index))
    }

    /// Ingests URLs with [`NetFetcher`], keyed by the URL.
    pub fn ingest_urls(&self, urls: Vec<String>) -> Result<HashMap<String, Document>, IngestError> {
        let documents = self.ingest(urls.into_iter().map(Source::Url).collect(), &NetFetcher)?;
        Ok(documents
            .into_iter()
            .filter_map(|(source, document)| match source {
                Source::Url(url) => Some((url, document)),
                _ => None,
            })
            .collect())
    }

    /// Ingests files with [`NetFetcher`], keyed by the path.
    pub fn ingest_files(
        &self,
        paths: Vec<PathBuf>,
    ) -> Result<HashMap<PathBuf, Document>, IngestError> {
        let documents = self.ingest(paths.into_iter().map(Source::File).collect(), &NetFetcher)?;
        Ok(documents
            .into_iter()
            .filter_map(|(source, document)| match source {
                Source::File(path) => Some((path, document)),
                _ => None,
            })
            .collect())
    }

    /// Parses raw HTML strings, keyed by the markup itself.
    pub fn ingest_html(
        &self,
        markup: Vec<String>,
    ) -> Result<HashMap<String, Document>, IngestError> {
        let documents = self.ingest(markup.into_iter().map(Source::Html).collect(), &NetFetcher)?;
        Ok(documents
            .into_iter()
            .filter_map(|(source, document)| match source {
                Source::Html(markup) => Some((markup, document)),
                _ => None,
            })
            .collect())
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}
