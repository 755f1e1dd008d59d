use uuid::Uuid;

use crate::airdrop::{
    fallback_name, now_millis, Airdrop, AirdropInput, FilterStatus, Status, Task,
};
use crate::status::derive_status;

/// In-memory collection of tracked airdrops plus the view parameters
///
/// The store owns every mutation entry point and recomputes the derived
/// status on each of them. It holds no durable backing: a fresh process
/// starts empty unless a snapshot is loaded on top of it.
#[derive(Debug, Clone, Default)]
pub struct AirdropStore {
    records: Vec<Airdrop>,
    search_term: String,
    filter_status: Option<FilterStatus>,
}

impl AirdropStore {
    pub fn new() -> Self {
        AirdropStore {
            records: Vec::new(),
            search_term: String::new(),
            filter_status: None,
        }
    }

    /// Add a new airdrop from input data
    ///
    /// Assigns a fresh id and `created_at`, substitutes the fallback name
    /// when none was given, derives the status and prepends the record so
    /// the collection stays most-recent-first. Always succeeds.
    ///
    /// # Arguments
    /// * `owner_id` - Identifier of the owning user or guest session
    /// * `input` - Field data from a form or import source
    ///
    /// # Returns
    /// * `&Airdrop` - The stored record
    pub fn add(&mut self, owner_id: &str, input: AirdropInput) -> &Airdrop {
        let record = self.build_record(owner_id, input, false);
        self.records.insert(0, record);
        &self.records[0]
    }

    fn build_record(&self, owner_id: &str, input: AirdropInput, trust_status: bool) -> Airdrop {
        let created_at = now_millis();

        let name = match input.name {
            Some(ref n) if !n.trim().is_empty() => n.trim().to_string(),
            _ => fallback_name(created_at),
        };

        let tasks: Vec<Task> = input
            .tasks
            .into_iter()
            .filter(|t| !t.text.trim().is_empty())
            .map(|t| Task {
                id: Uuid::new_v4().to_string(),
                text: t.text.trim().to_string(),
                completed: t.completed,
            })
            .collect();

        let status = match (trust_status, input.status) {
            (true, Some(status)) => status,
            _ => derive_status(&tasks, input.start_date, input.deadline, created_at),
        };

        Airdrop {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name,
            description: input.description,
            notes: input.notes,
            wallet_address: input.wallet_address,
            blockchain: input.blockchain,
            airdrop_link: input.airdrop_link,
            referral_code: input.referral_code,
            airdrop_type: input.airdrop_type,
            information_source: input.information_source,
            participation_requirements: input.participation_requirements,
            user_defined_status: input.user_defined_status,
            token_amount: input.token_amount,
            start_date: input.start_date,
            deadline: input.deadline,
            registration_date: input.registration_date,
            claim_date: input.claim_date,
            tasks,
            status,
            created_at,
        }
    }

    /// Replace the stored record matching `airdrop.id`
    ///
    /// The status is recomputed from the incoming tasks and dates; the
    /// original id, owner and creation instant are kept.
    ///
    /// # Returns
    /// * `Result<(), String>` - Ok, or an error if no record has that id
    pub fn update(&mut self, airdrop: Airdrop) -> Result<(), String> {
        let now = now_millis();
        let slot = self
            .records
            .iter_mut()
            .find(|r| r.id == airdrop.id)
            .ok_or_else(|| format!("No airdrop with id {}", airdrop.id))?;

        let mut incoming = airdrop;
        incoming.id = slot.id.clone();
        incoming.owner_id = slot.owner_id.clone();
        incoming.created_at = slot.created_at;
        incoming.status = derive_status(
            &incoming.tasks,
            incoming.start_date,
            incoming.deadline,
            now,
        );

        *slot = incoming;
        Ok(())
    }

    /// Remove the record with the given id; no-op when absent.
    pub fn delete(&mut self, id: &str) {
        self.records.retain(|r| r.id != id);
    }

    /// Flip the completion flag of one task and re-derive the status
    ///
    /// # Returns
    /// * `Result<Status, String>` - The new status, or an error when
    ///   either id is unknown
    pub fn toggle_task(&mut self, airdrop_id: &str, task_id: &str) -> Result<Status, String> {
        let now = now_millis();
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == airdrop_id)
            .ok_or_else(|| format!("No airdrop with id {}", airdrop_id))?;

        let task = record
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| format!("No task with id {}", task_id))?;

        task.completed = !task.completed;
        record.status = derive_status(&record.tasks, record.start_date, record.deadline, now);
        Ok(record.status)
    }

    /// Append a new checklist task to a record and re-derive its status.
    pub fn add_task(&mut self, airdrop_id: &str, text: &str) -> Result<&Task, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("Task text cannot be empty".to_string());
        }

        let now = now_millis();
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == airdrop_id)
            .ok_or_else(|| format!("No airdrop with id {}", airdrop_id))?;

        record.tasks.push(Task::new(text));
        record.status = derive_status(&record.tasks, record.start_date, record.deadline, now);
        Ok(record.tasks.last().unwrap())
    }

    /// Remove one checklist task; the parent record stays.
    pub fn remove_task(&mut self, airdrop_id: &str, task_id: &str) -> Result<(), String> {
        let now = now_millis();
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == airdrop_id)
            .ok_or_else(|| format!("No airdrop with id {}", airdrop_id))?;

        let before = record.tasks.len();
        record.tasks.retain(|t| t.id != task_id);
        if record.tasks.len() == before {
            return Err(format!("No task with id {}", task_id));
        }

        record.status = derive_status(&record.tasks, record.start_date, record.deadline, now);
        Ok(())
    }

    /// Ingest a batch of inputs through the raw import path
    ///
    /// The batch lands as a contiguous block ahead of the pre-existing
    /// records, in input order. A supplied status is trusted per item;
    /// items without one get a derived status.
    ///
    /// # Returns
    /// * `usize` - Number of records added
    pub fn bulk_add(&mut self, owner_id: &str, items: Vec<AirdropInput>) -> usize {
        let built: Vec<Airdrop> = items
            .into_iter()
            .map(|input| self.build_record(owner_id, input, true))
            .collect();
        let added = built.len();
        self.records.splice(0..0, built);
        added
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn set_filter_status(&mut self, filter: FilterStatus) {
        self.filter_status = Some(filter);
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn filter_status(&self) -> FilterStatus {
        self.filter_status.unwrap_or(FilterStatus::All)
    }

    /// The visible subset under the current search term and status filter
    ///
    /// Records are kept when their status passes the filter and the search
    /// term occurs case-insensitively in the name or description. A linear
    /// scan over the whole collection, recomputed per call.
    pub fn visible(&self) -> Vec<&Airdrop> {
        let filter = self.filter_status();
        let term = self.search_term.to_lowercase();

        self.records
            .iter()
            .filter(|r| filter.accepts(r.status))
            .filter(|r| {
                if term.is_empty() {
                    return true;
                }
                r.name.to_lowercase().contains(&term)
                    || r.description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&term))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Visible subset restricted to one owner.
    pub fn visible_for(&self, owner_id: &str) -> Vec<&Airdrop> {
        self.visible()
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Airdrop> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Full collection in store order (newest first), ignoring the view.
    pub fn records(&self) -> &[Airdrop] {
        &self.records
    }

    /// Clones of one owner's records in store order.
    pub fn records_for(&self, owner_id: &str) -> Vec<Airdrop> {
        self.records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Replace one owner's records with a previously saved set
    ///
    /// Loaded records keep the status they were saved with; everything
    /// belonging to other owners is untouched.
    pub fn restore(&mut self, owner_id: &str, records: Vec<Airdrop>) {
        self.records.retain(|r| r.owner_id != owner_id);
        let owned: Vec<Airdrop> = records
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .collect();
        self.records.splice(0..0, owned);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
