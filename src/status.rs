use crate::airdrop::{Status, Task};

/// Derive the lifecycle status of an airdrop
///
/// The rule, checked in order:
/// 1. A non-empty task list with every task completed is `Completed`.
/// 2. A deadline strictly in the past is `Completed`.
/// 3. A start date at or before `now` is `Active`.
/// 4. Everything else is `Upcoming`.
///
/// An empty task list never triggers rule 1; only an elapsed deadline can
/// complete an airdrop with no tasks. `now` must be the evaluation instant
/// at the moment of mutation, never a cached value.
///
/// # Arguments
/// * `tasks` - Checklist of the airdrop (order is irrelevant here)
/// * `start_date` - Optional start instant, epoch milliseconds
/// * `deadline` - Optional deadline instant, epoch milliseconds
/// * `now` - Evaluation instant, epoch milliseconds
///
/// # Returns
/// * `Status` - The derived lifecycle status
///
/// # Examples
/// ```
/// use droptrack::airdrop::Status;
/// use droptrack::status::derive_status;
///
/// // No dates, no tasks: nothing has happened yet
/// assert_eq!(derive_status(&[], None, None, 1_000), Status::Upcoming);
///
/// // Deadline already passed
/// assert_eq!(derive_status(&[], None, Some(500), 1_000), Status::Completed);
/// ```
pub fn derive_status(
    tasks: &[Task],
    start_date: Option<i64>,
    deadline: Option<i64>,
    now: i64,
) -> Status {
    if !tasks.is_empty() && tasks.iter().all(|t| t.completed) {
        return Status::Completed;
    }

    if let Some(deadline) = deadline {
        if deadline < now {
            return Status::Completed;
        }
    }

    if let Some(start) = start_date {
        if start <= now {
            return Status::Active;
        }
    }

    Status::Upcoming
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(completed: bool) -> Task {
        Task {
            id: "t".to_string(),
            text: "do the thing".to_string(),
            completed,
        }
    }

    const NOW: i64 = 1_000_000;

    #[test]
    fn no_dates_no_tasks_is_upcoming() {
        assert_eq!(derive_status(&[], None, None, NOW), Status::Upcoming);
    }

    #[test]
    fn all_tasks_complete_wins_over_everything() {
        let tasks = vec![task(true), task(true)];
        // Even with a future deadline and no start date yet
        assert_eq!(
            derive_status(&tasks, Some(NOW + 10), Some(NOW + 20), NOW),
            Status::Completed
        );
    }

    #[test]
    fn empty_task_list_never_completes_by_tasks() {
        // All-of-nothing must not count as "all complete"
        assert_eq!(
            derive_status(&[], Some(NOW - 10), Some(NOW + 10), NOW),
            Status::Active
        );
    }

    #[test]
    fn one_incomplete_task_blocks_completion() {
        let tasks = vec![task(true), task(false)];
        assert_eq!(
            derive_status(&tasks, Some(NOW - 10), Some(NOW + 10), NOW),
            Status::Active
        );
    }

    #[test]
    fn elapsed_deadline_completes_regardless_of_tasks() {
        let tasks = vec![task(false)];
        assert_eq!(
            derive_status(&tasks, Some(NOW - 10), Some(NOW - 1), NOW),
            Status::Completed
        );
    }

    #[test]
    fn deadline_exactly_now_is_not_elapsed() {
        assert_eq!(
            derive_status(&[], Some(NOW - 10), Some(NOW), NOW),
            Status::Active
        );
    }

    #[test]
    fn start_date_exactly_now_is_active() {
        assert_eq!(derive_status(&[], Some(NOW), None, NOW), Status::Active);
    }

    #[test]
    fn future_start_date_is_upcoming() {
        assert_eq!(
            derive_status(&[], Some(NOW + 1), Some(NOW + 100), NOW),
            Status::Upcoming
        );
    }
}
