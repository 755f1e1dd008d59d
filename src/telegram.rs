use crate::airdrop::{now_millis, AirdropInput};
use crate::sheet::split_tasks;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Placeholder Telegram feed
///
/// Stands in for a channel-scraping integration: returns a fixed set of
/// sample announcements shaped like any other import source. Deadlines are
/// offsets from the current instant so the samples stay meaningful.
pub fn sample_feed() -> Vec<AirdropInput> {
    let now = now_millis();

    vec![
        AirdropInput {
            name: Some("Nexus Points Season 2".to_string()),
            description: Some("Bridge volume campaign announced on the official channel".to_string()),
            airdrop_link: Some("https://t.me/nexus_announcements/412".to_string()),
            blockchain: Some("Ethereum".to_string()),
            information_source: Some("Telegram".to_string()),
            start_date: Some(now - 3 * DAY_MS),
            deadline: Some(now + 21 * DAY_MS),
            tasks: split_tasks("Bridge at least 0.05 ETH; Swap on the native DEX; Hold for 14 days"),
            ..Default::default()
        },
        AirdropInput {
            name: Some("Solmesh Testnet Quest".to_string()),
            description: Some("Testnet feedback round, rewards snapshot at the end of the month".to_string()),
            airdrop_link: Some("https://t.me/solmesh/88".to_string()),
            blockchain: Some("Solana".to_string()),
            information_source: Some("Telegram".to_string()),
            start_date: Some(now + 2 * DAY_MS),
            deadline: Some(now + 30 * DAY_MS),
            tasks: split_tasks("Claim testnet tokens; Report one bug"),
            ..Default::default()
        },
        AirdropInput {
            name: Some("Veldt Retro Claim".to_string()),
            description: Some("Retroactive distribution for early governance voters".to_string()),
            airdrop_link: Some("https://t.me/veldt_dao/1290".to_string()),
            blockchain: Some("Arbitrum".to_string()),
            information_source: Some("Telegram".to_string()),
            deadline: Some(now - DAY_MS),
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airdrop::Status;
    use crate::store::AirdropStore;

    #[test]
    fn feed_ingests_through_the_bulk_path() {
        let mut store = AirdropStore::new();
        let added = store.bulk_add("guest", sample_feed());
        assert_eq!(added, 3);

        // The expired retro claim derives Completed, the running campaign Active
        let statuses: Vec<Status> = store.records().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Active, Status::Upcoming, Status::Completed]
        );
    }
}
