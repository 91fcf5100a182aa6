//! The per-event state machine composing gate → resolver → chat →
//! formatting → delivery.
//!
//! Every inbound event runs this once, in its own task, to completion.
//! There is no mid-flight cancellation and no automatic retry: a failed
//! remote call is terminal for the event and the user gets a short generic
//! notice.

use std::sync::Arc;

use tracing::{debug, info, warn};

use courier_core::{config::LimitsConfig, CourierError, InboundEvent};
use courier_format::{assemble, render_blocks, segment, Chunk, FeedbackPolicy, Inline};
use courier_store::EventGate;

use crate::collaborators::{LlmBackend, Messenger};
use crate::resolver::ContextResolver;

/// Phases an event moves through. Terminal phases are `Done`, `Discarded`
/// and `ErrorNotify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Received,
    Admitted,
    ContextResolving,
    ContextReady,
    AwaitingReply,
    Segmenting,
    Rendering,
    Chunking,
    Delivering,
    Done,
    Discarded,
    ErrorNotify,
}

/// How an event ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Duplicate delivery, silently dropped. Not an error.
    Duplicate,
    Answered {
        chunks_sent: usize,
        chunks_failed: usize,
    },
    /// Terminal failure; the user was notified with a generic notice.
    Failed,
}

/// Host context handed to the pipeline. Adapters implement this once and
/// share it across all events.
pub trait EventContext: Send + Sync {
    fn gate(&self) -> &EventGate;
    fn resolver(&self) -> &ContextResolver;
    fn backend(&self) -> &Arc<dyn LlmBackend>;
    fn messenger(&self) -> &Arc<dyn Messenger>;
    fn limits(&self) -> &LimitsConfig;
    fn feedback(&self) -> &FeedbackPolicy;
}

/// Run one inbound event through the full pipeline.
pub async fn process_event<C: EventContext + ?Sized>(
    ctx: &Arc<C>,
    event: InboundEvent,
) -> EventOutcome {
    let mut phase = EventPhase::Received;
    let event_id = event.event_id.as_str();

    if !ctx.gate().admit(event_id) {
        advance(&mut phase, EventPhase::Discarded, event_id);
        debug!(event_id, "duplicate event discarded");
        return EventOutcome::Duplicate;
    }
    advance(&mut phase, EventPhase::Admitted, event_id);

    let thread_root = event.thread_root_key().to_string();

    advance(&mut phase, EventPhase::ContextResolving, event_id);
    let context = match ctx
        .resolver()
        .resolve(ctx.backend(), &event.channel_id, &thread_root, &event.text)
        .await
    {
        Ok(context) => context,
        Err(e) => {
            warn!(event_id, error = %e, code = e.code(), "context resolution failed");
            return notify_failure(ctx, &event, &thread_root, &e, &mut phase).await;
        }
    };
    advance(&mut phase, EventPhase::ContextReady, event_id);

    advance(&mut phase, EventPhase::AwaitingReply, event_id);
    let timeout = ctx.limits().request_timeout();
    let reply = match tokio::time::timeout(
        timeout,
        ctx.backend()
            .chat(&context.workspace, &context.remote_thread_id, &event.text),
    )
    .await
    {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            let err = CourierError::Upstream(e.to_string());
            warn!(event_id, error = %e, "chat call failed");
            return notify_failure(ctx, &event, &thread_root, &err, &mut phase).await;
        }
        Err(_) => {
            let err = CourierError::UpstreamTimeout {
                secs: timeout.as_secs(),
            };
            warn!(event_id, timeout_secs = timeout.as_secs(), "chat call timed out");
            return notify_failure(ctx, &event, &thread_root, &err, &mut phase).await;
        }
    };

    advance(&mut phase, EventPhase::Segmenting, event_id);
    let segments = segment(&reply);

    advance(&mut phase, EventPhase::Rendering, event_id);
    let blocks = render_blocks(&segments);

    advance(&mut phase, EventPhase::Chunking, event_id);
    let limits = ctx.limits();
    let mut chunks = assemble(&blocks, limits.text_ceiling, limits.code_ceiling);
    ctx.feedback().attach(&mut chunks, &reply);

    advance(&mut phase, EventPhase::Delivering, event_id);
    let (mut sent, mut failed) = (0usize, 0usize);
    for (index, chunk) in chunks.iter().enumerate() {
        if chunk.is_empty() {
            continue;
        }
        match ctx
            .messenger()
            .post(&event.channel_id, &thread_root, chunk)
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                // One chunk failing must not abort the rest.
                warn!(event_id, chunk_index = index, error = %e, "chunk delivery failed");
                failed += 1;
            }
        }
    }

    advance(&mut phase, EventPhase::Done, event_id);
    info!(
        event_id,
        workspace = %context.workspace,
        chunks_sent = sent,
        chunks_failed = failed,
        "event complete"
    );
    EventOutcome::Answered {
        chunks_sent: sent,
        chunks_failed: failed,
    }
}

fn advance(phase: &mut EventPhase, next: EventPhase, event_id: &str) {
    debug!(event_id, from = ?*phase, to = ?next, "phase");
    *phase = next;
}

/// Post the generic failure notice. Best-effort: a failure here is only
/// logged, the event is terminal either way.
async fn notify_failure<C: EventContext + ?Sized>(
    ctx: &Arc<C>,
    event: &InboundEvent,
    thread_root: &str,
    err: &CourierError,
    phase: &mut EventPhase,
) -> EventOutcome {
    advance(phase, EventPhase::ErrorNotify, &event.event_id);
    let notice = notice_chunk(err);
    if let Err(e) = ctx
        .messenger()
        .post(&event.channel_id, thread_root, &notice)
        .await
    {
        warn!(event_id = %event.event_id, error = %e, "failed to deliver error notice");
    }
    EventOutcome::Failed
}

fn notice_chunk(err: &CourierError) -> Chunk {
    let text = err.user_notice();
    Chunk {
        blocks: vec![courier_format::Block::Rich {
            runs: vec![Inline::plain(text)],
        }],
        fallback: text.to_string(),
        sequence: None,
        degraded_split: false,
        feedback: None,
    }
}
