use std::collections::VecDeque;
use std::sync::Mutex;

const HISTORY_SIZE: usize = 5;

/// Issues short hex identifiers that tie the log lines of one request together.
///
/// Ids are 16 hex chars (64 random bits). Each new id is checked against the last
/// few issued ids and regenerated on a clash, so two requests arriving back to back
/// never share one.
#[derive(Debug, Default)]
pub struct CorrelationIdGenerator {
    recent: Mutex<VecDeque<String>>,
}

impl CorrelationIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let mut recent = match self.recent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut id = random_id();
        while recent.contains(&id) {
            id = random_id();
        }

        if recent.len() == HISTORY_SIZE {
            recent.pop_front();
        }
        recent.push_back(id.clone());

        id
    }
}

fn random_id() -> String {
    (0..4)
        .map(|_| format!("{:04x}", rand::random::<u16>()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_format() {
        let generator = CorrelationIdGenerator::new();
        let id = generator.next_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_consecutive_ids_differ() {
        let generator = CorrelationIdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_history_is_bounded() {
        let generator = CorrelationIdGenerator::new();
        for _ in 0..20 {
            generator.next_id();
        }
        assert_eq!(generator.recent.lock().unwrap().len(), HISTORY_SIZE);
    }
}
