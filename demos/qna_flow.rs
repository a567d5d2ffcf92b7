//! # Example: qna_flow
//!
//! Walks one Q&A session through the failure modes the action core absorbs:
//!
//! 1. A throttled question insert is retried and commits.
//! 2. An upvote whose card refresh is declined is reverted.
//! 3. A question whose notification and revert both fail ends up in the
//!    [`RemediationLog`].
//! 4. Marking a question answered after the session ended returns
//!    `SessionInactive`.
//!
//! ## Flow
//! ```text
//! create_question ─► insert throttled ─► RetryScheduled ─► insert ok ─► notify ok ─► Committed
//! update_upvote   ─► add voter ─► notify Ok(false) ─► restore vote ─► Reverted
//! create_question ─► insert ok ─► notify Ok(false) ─► delete fails ─► RevertFailed
//! end_session     ─► deactivate ─► notify ok ─► Committed
//! mark_answered   ─► touch session ─► SessionInactive ─► best-effort session-ended notice
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=qnasaga=debug cargo run --example qna_flow
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use qnasaga::{
    Config, FaultyStore, LogWriter, MemoryStore, Notice, NotifierFn, NotifierRef, NotifyError,
    QnaServices, RemediationLog, StoreError, StoreOp, Subscribe, UserId,
};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qnasaga=info")),
        )
        .init();

    // 1. Configuration from QNA_* variables (defaults when unset)
    let cfg = Config::from_env()?;

    // 2. Store with scripted faults, notifier with a kill switch
    let store = Arc::new(FaultyStore::new(MemoryStore::new()));
    let accept = Arc::new(AtomicBool::new(true));
    let switch = accept.clone();
    let notifier: NotifierRef = NotifierFn::arc("card-refresh", move |notice: Notice| {
        let ok = switch.load(Ordering::SeqCst);
        async move {
            println!("[notify] {} accepted={ok}", notice.kind.as_label());
            Ok::<_, NotifyError>(ok)
        }
    });

    // 3. Subscribers
    let remediation = RemediationLog::new();
    let subs: Vec<Arc<dyn Subscribe>> = vec![
        Arc::new(LogWriter::new()) as Arc<dyn Subscribe>,
        Arc::new(remediation.clone()) as Arc<dyn Subscribe>,
    ];

    let services = QnaServices::builder(cfg)
        .with_store(store.clone())
        .with_notifier(notifier)
        .with_subscribers(subs)
        .build();
    let ctl = services.controller();

    let host = UserId::from("host");
    let session = ctl.start_session("Quarterly AMA", host, "conv-42").await?;

    // Throttled twice, then the insert goes through.
    store.fail_times(StoreOp::InsertQuestion, 2, StoreError::throttled());
    let question = ctl
        .create_question(session.id, UserId::from("ann"), "When is the next release?")
        .await?;
    println!("[demo] question committed: {}", question.id);

    // Card refresh declines: the vote is taken back.
    accept.store(false, Ordering::SeqCst);
    match ctl.update_upvote(question.id, &UserId::from("bob"), true).await {
        Ok(_) => println!("[demo] unexpected commit"),
        Err(e) => println!("[demo] upvote: {} ({})", e.as_label(), e.as_message()),
    }

    // Notification declined and the delete fails: inconsistent.
    store.fail_next(
        StoreOp::DeleteQuestion,
        StoreError::from_code(13, "unauthorized"),
    );
    if let Err(e) = ctl
        .create_question(session.id, UserId::from("carl"), "Is this kept?")
        .await
    {
        println!("[demo] create: {} fatal={}", e.as_label(), e.is_fatal());
    }

    accept.store(true, Ordering::SeqCst);
    ctl.end_session(session.id).await?;

    if let Err(e) = ctl.mark_question_answered(question.id).await {
        println!("[demo] mark answered: {}", e.as_label());
    }

    let board = ctl.leaderboard(session.id).await?;
    println!(
        "[demo] leaderboard: {} open, {} answered",
        board.open.len(),
        board.answered.len()
    );

    services.shutdown().await;
    for record in remediation.snapshot().await {
        println!(
            "[remediation] {} on {}: {}",
            record.action, record.entity, record.reason
        );
    }
    Ok(())
}
