//! Statistics use case

use time::OffsetDateTime;

use crate::{
    model::{ChatStats, DayWindow, RecordFilter},
    ports::{ChatRegistry, MessageStore, StoreError},
    zone::Zone,
};

/// Count active chats plus today's messages and requests.
///
/// "Today" is the calendar day containing `now` in `zone`, the same window
/// the report job uses.
pub async fn collect_stats<St, Ch>(
    store: &St,
    chats: &Ch,
    now: OffsetDateTime,
    zone: Zone,
) -> Result<ChatStats, StoreError>
where
    St: MessageStore + ?Sized,
    Ch: ChatRegistry + ?Sized,
{
    let window = DayWindow::containing(now, zone);

    let active_chats = chats.count_active().await?;
    let messages_today = store.count_records(&RecordFilter::all_in(window)).await?;
    let requests_today = store
        .count_records(&RecordFilter::requests_in(window))
        .await?;

    tracing::debug!(active_chats, messages_today, requests_today, "Collected stats");

    Ok(ChatStats {
        active_chats,
        messages_today,
        requests_today,
        at: zone.to_local(now),
    })
}
