use super::utils::{StoreOptions, open_store, truncate};
use anyhow::{Result, bail};
use clap::Args;
use cynefin_application::LoadOutcome;
use cynefin_core::history::HistoryFilter;
use cynefin_core::session::{AnalysisOutcome, CausalResult, CynefinDomain, FullResult, Session};

/// Fields of a session recorded from the command line.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// The question that was analysed
    pub query: String,
    #[arg(long, default_value = "disorder")]
    pub domain: CynefinDomain,
    #[arg(long, default_value_t = 0.0)]
    pub confidence: f64,
    #[arg(long, default_value = "")]
    pub narrative: String,
    /// Tag the session (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long, default_value_t = 0)]
    pub duration_ms: u64,
    /// Estimated causal effect
    #[arg(long, allow_hyphen_values = true)]
    pub effect: Option<f64>,
    #[arg(long)]
    pub refutations_passed: Option<u32>,
    #[arg(long)]
    pub refutations_total: Option<u32>,
    /// Record the session as failed with this message
    #[arg(long, conflicts_with_all = ["effect", "refutations_passed", "refutations_total"])]
    pub error: Option<String>,
}

impl RecordArgs {
    fn into_session(self) -> Result<Session> {
        if !(0.0..=1.0).contains(&self.confidence) {
            bail!("confidence must be between 0 and 1, got {}", self.confidence);
        }

        let outcome = if let Some(message) = self.error {
            AnalysisOutcome::Error { message }
        } else if self.effect.is_some()
            || self.refutations_passed.is_some()
            || self.refutations_total.is_some()
        {
            AnalysisOutcome::Causal(CausalResult {
                effect: self.effect,
                refutations_passed: self.refutations_passed,
                refutations_total: self.refutations_total,
                ..CausalResult::default()
            })
        } else {
            AnalysisOutcome::Absent
        };

        let result = FullResult::new(self.domain, self.confidence, outcome).with_narrative(self.narrative);
        let mut session = Session::new(self.query, result);
        session.tags = self.tags;
        session.duration_ms = self.duration_ms;
        Ok(session)
    }
}

pub fn list(
    options: &StoreOptions,
    text: Option<String>,
    domain: Option<CynefinDomain>,
    tag: Option<String>,
    json: bool,
) -> Result<()> {
    let store = open_store(options)?;
    let filter = HistoryFilter { text, domain, tag };
    let sessions = store.list_filtered(&filter);

    if json {
        let summaries: Vec<_> = sessions
            .iter()
            .filter_map(|session| store.get_summary(&session.id))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions recorded.");
        return Ok(());
    }

    for session in &sessions {
        let classification = &session.result.classification;
        println!(
            "{:<36}  {:<25}  {:<11}  {:>4.2}  {}",
            session.id,
            truncate(&session.timestamp, 25),
            classification.domain.as_str(),
            classification.confidence,
            truncate(&session.query, 60)
        );
    }
    println!("\n{} of {} sessions", sessions.len(), store.len());

    Ok(())
}

pub fn show(options: &StoreOptions, id: &str) -> Result<()> {
    let mut store = open_store(options)?;

    match store.load_full(id) {
        LoadOutcome::Found(session) => {
            if session.is_placeholder() {
                eprintln!("Full result for '{}' is no longer stored; showing its summary.", id);
            }
            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
        LoadOutcome::NotFound => bail!("No session with id '{}'", id),
    }
}

pub fn record(options: &StoreOptions, args: RecordArgs) -> Result<()> {
    let mut store = open_store(options)?;
    let session = args.into_session()?;

    let report = store.save(&session);

    if !report.is_fully_persisted() {
        eprintln!("Warning: storage is full, the session may not survive a restart.");
    }
    for evicted in &report.evicted {
        eprintln!("Evicted oldest session {}", evicted);
    }
    println!("{}", session.id);

    Ok(())
}

pub fn delete(options: &StoreOptions, id: &str) -> Result<()> {
    let mut store = open_store(options)?;

    if store.delete(id) {
        println!("Deleted {}", id);
    } else {
        println!("No session with id '{}'", id);
    }
    Ok(())
}

pub fn clear(options: &StoreOptions) -> Result<()> {
    let mut store = open_store(options)?;
    let count = store.len();

    store.clear();

    println!("Cleared {} sessions", count);
    Ok(())
}

pub fn stats(options: &StoreOptions) -> Result<()> {
    let store = open_store(options)?;
    let stats = store.stats();

    println!("Sessions:          {} / {}", stats.sessions, stats.cap);
    println!("Stored results:    {}", stats.persisted_results);
    for (domain, count) in &stats.by_domain {
        println!("  {:<16} {}", domain.as_str(), count);
    }

    Ok(())
}

pub fn compact(options: &StoreOptions) -> Result<()> {
    let mut store = open_store(options)?;

    let removed = store.compact();

    println!("Removed {} orphaned results", removed.len());
    Ok(())
}
