use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use scaleslip_core::WorksheetRef;

/// One async mutex per destination worksheet.
///
/// Serializes read-plan-write cycles on the same tab inside this process so
/// two first submissions cannot both write a header row. Writers in other
/// processes are not covered.
#[derive(Debug, Default)]
pub struct WorksheetLocks {
    locks: Mutex<HashMap<WorksheetRef, Arc<AsyncMutex<()>>>>,
}

impl WorksheetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `worksheet`.
    pub async fn acquire(&self, worksheet: &WorksheetRef) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            map.entry(worksheet.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_worksheet_is_exclusive() {
        let locks = Arc::new(WorksheetLocks::new());
        let ws = WorksheetRef::new("s", "West");

        let guard = locks.acquire(&ws).await;
        let contender = {
            let locks = locks.clone();
            let ws = ws.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&ws).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_worksheets_do_not_block() {
        let locks = WorksheetLocks::new();
        let _west = locks.acquire(&WorksheetRef::new("s", "West")).await;
        let _east = locks.acquire(&WorksheetRef::new("s", "East")).await;
        assert_eq!(locks.len(), 2);
    }
}
