//! Interaction listener: polls the mentions feed, stores new interactions
//! exactly once, and answers the unresponded backlog.

use crate::error::ListenerResult;
use murmur_core::{
    Draft, DraftKind, DraftLinkage, DraftSink, Generator, Interaction, InteractionKind,
    MentionsFeed, Notification, Publisher,
};
use murmur_db::Database;
use murmur_rag::RetrievalEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What to do with a generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Save the reply for human review.
    Draft,
    /// Publish the reply immediately; only a successful publish marks the
    /// interaction responded.
    AutoReply,
}

/// Configuration for an interaction listener instance.
#[derive(Debug, Clone)]
pub struct InteractionListenerConfig {
    pub mode: ResponseMode,
    /// Our own account handle. Self-authored events are stored but never
    /// answered.
    pub account: String,
    pub poll_interval: Duration,
    pub top_k: usize,
    /// Unresponded interactions processed per tick.
    pub batch_size: usize,
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionTickSummary {
    /// New interactions stored this tick.
    pub stored: usize,
    /// Feed events skipped because their external id was already stored.
    pub duplicates: usize,
    /// Interactions marked responded this tick.
    pub responded: usize,
    pub errors: usize,
}

/// Polls the mentions feed and answers new interactions.
pub struct InteractionListener {
    feed: Arc<dyn MentionsFeed>,
    engine: RetrievalEngine,
    generator: Arc<dyn Generator>,
    publisher: Arc<dyn Publisher>,
    drafts: Arc<dyn DraftSink>,
    db: Database,
    config: InteractionListenerConfig,
}

impl InteractionListener {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        feed: Arc<dyn MentionsFeed>,
        engine: RetrievalEngine,
        generator: Arc<dyn Generator>,
        publisher: Arc<dyn Publisher>,
        drafts: Arc<dyn DraftSink>,
        db: Database,
        config: InteractionListenerConfig,
    ) -> Self {
        Self {
            feed,
            engine,
            generator,
            publisher,
            drafts,
            db,
            config,
        }
    }

    /// Run one poll cycle: fetch, store new events, then answer the
    /// unresponded backlog (including leftovers from earlier failed
    /// ticks). A failure on one interaction never blocks the rest.
    pub async fn tick(&self) -> InteractionTickSummary {
        let mut summary = InteractionTickSummary::default();

        // A feed outage abandons only the fetch; the backlog below still
        // runs, and the feed is retried on the next interval.
        let notifications = match self.feed.fetch_notifications().await {
            Ok(notifications) => notifications,
            Err(e) => {
                warn!("Failed to fetch notifications: {}", e);
                summary.errors += 1;
                Vec::new()
            }
        };

        for notification in &notifications {
            match self.store_notification(notification) {
                Ok(true) => summary.stored += 1,
                Ok(false) => summary.duplicates += 1,
                Err(e) => {
                    summary.errors += 1;
                    if e.is_integrity_violation() {
                        error!(
                            "Integrity violation storing interaction {}: {}",
                            notification.external_id, e
                        );
                    } else {
                        warn!(
                            "Failed to store interaction {}: {}",
                            notification.external_id, e
                        );
                    }
                }
            }
        }

        let backlog = match self.db.unresponded_interactions(self.config.batch_size) {
            Ok(backlog) => backlog,
            Err(e) => {
                warn!("Failed to load unresponded interactions: {}", e);
                summary.errors += 1;
                return summary;
            }
        };

        for interaction in backlog {
            match self.respond(&interaction).await {
                Ok(()) => summary.responded += 1,
                Err(e) => {
                    summary.errors += 1;
                    warn!(
                        "Failed to respond to interaction {} from @{}: {}",
                        interaction.external_id, interaction.author, e
                    );
                }
            }
        }

        summary
    }

    /// Persist a feed event unless its external id is already stored.
    /// Returns whether a new row was created.
    fn store_notification(&self, notification: &Notification) -> ListenerResult<bool> {
        if self.db.interaction_exists(&notification.external_id)? {
            debug!("Interaction {} already stored", notification.external_id);
            return Ok(false);
        }

        // A reply to one of our own published posts is recorded as a
        // comment. Lookup only; nothing is mutated on the parent.
        let mut kind = notification.kind;
        if let Some(parent) = &notification.in_reply_to {
            if self.db.find_draft_by_external_post(parent)?.is_some() {
                kind = InteractionKind::Comment;
            }
        }

        let mut interaction = Interaction::new(
            notification.external_id.as_str(),
            kind,
            notification.author.as_str(),
            notification.content.as_str(),
        );
        if let Some(parent) = &notification.in_reply_to {
            interaction = interaction.with_in_reply_to(parent.as_str());
        }

        self.db.insert_interaction(&interaction)?;
        info!(
            "Stored new {} from @{} ({})",
            kind, notification.author, notification.external_id
        );
        Ok(true)
    }

    /// Generate and deliver a reply for one interaction, then mark it
    /// responded. In auto-reply mode a publish failure propagates before
    /// the mark, leaving the interaction to be retried next tick.
    async fn respond(&self, interaction: &Interaction) -> ListenerResult<()> {
        if self.is_self_authored(&interaction.author) {
            debug!("Skipping self-authored interaction {}", interaction.external_id);
            self.db.mark_interaction_responded(&interaction.id, None)?;
            return Ok(());
        }

        let results = self
            .engine
            .retrieve(&interaction.content, self.config.top_k, None)
            .await?;
        let context = RetrievalEngine::build_context(&results);

        let instruction = format!(
            "Reply to this {} from @{}: \"{}\". Write one short, friendly reply.",
            interaction.kind, interaction.author, interaction.content
        );
        let generated = self.generator.generate(&context, &instruction).await?;

        let mention = format!("@{}", interaction.author);
        let reply = if generated.starts_with(&mention) {
            generated
        } else {
            format!("{} {}", mention, generated)
        };

        match self.config.mode {
            ResponseMode::Draft => {
                let artifact_id = self.drafts.save_draft(
                    &reply,
                    DraftKind::Reply,
                    DraftLinkage::interaction(interaction.external_id.as_str()),
                )?;
                self.db
                    .mark_interaction_responded(&interaction.id, Some(&artifact_id))?;
                info!(
                    "Drafted reply {} to @{} ({})",
                    artifact_id, interaction.author, interaction.external_id
                );
            }
            ResponseMode::AutoReply => {
                let post_id = self
                    .publisher
                    .publish(&reply, Some(interaction.external_id.as_str()))
                    .await?;

                let draft = Draft::new(reply.as_str(), DraftKind::Reply)
                    .with_linkage(DraftLinkage::interaction(interaction.external_id.as_str()));
                self.db.insert_draft(&draft)?;
                self.db.mark_draft_posted(&draft.id, &post_id)?;
                self.db
                    .mark_interaction_responded(&interaction.id, Some(&draft.id))?;
                info!(
                    "Published reply {} to @{} ({})",
                    post_id, interaction.author, interaction.external_id
                );
            }
        }

        Ok(())
    }

    fn is_self_authored(&self, author: &str) -> bool {
        !self.config.account.is_empty() && author == self.config.account
    }

    /// Poll on the configured interval until the shutdown signal flips or
    /// the iteration bound is reached. The signal is checked at tick
    /// boundaries only, never mid-item.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, max_iterations: Option<u64>) {
        info!(
            "Starting interaction listener ({:?} mode), interval {:?}",
            self.config.mode, self.config.poll_interval
        );

        let mut iteration = 0u64;

        loop {
            if *shutdown.borrow() {
                info!("Interaction listener stopping on shutdown signal");
                break;
            }

            iteration += 1;
            debug!("Interaction poll #{}", iteration);

            let summary = self.tick().await;
            info!(
                "Interaction poll #{}: {} new, {} duplicates, {} responded, {} errors",
                iteration, summary.stored, summary.duplicates, summary.responded, summary.errors
            );

            if let Some(max) = max_iterations {
                if iteration >= max {
                    info!("Interaction listener reached max iterations ({})", max);
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
    }
}
