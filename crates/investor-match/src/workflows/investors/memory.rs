use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    BatchProgressState, InvestorId, InvestorRecord, MatchAnalysis, MatchAnalysisRecord,
    NewInvestor,
};
use super::repository::{
    AnalysisQuery, AnalysisRepository, AnalysisSlice, InvestorRepository, ProgressRepository,
    RepositoryError,
};

#[derive(Debug, Default)]
struct MemoryState {
    investors: BTreeMap<InvestorId, InvestorRecord>,
    next_investor_id: u64,
    analyses: Vec<MatchAnalysisRecord>,
    next_analysis_id: u64,
    progress: HashMap<String, BatchProgressState>,
}

/// Process-local store backing all three collections. Cloning shares the same state.
#[derive(Debug, Default, Clone)]
pub struct InMemoryInvestorStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryInvestorStore {
    pub fn with_investors(investors: impl IntoIterator<Item = NewInvestor>) -> Self {
        let store = Self::default();
        {
            let mut state = store.lock();
            for investor in investors {
                insert_investor(&mut state, investor);
            }
        }
        store
    }

    pub fn analyses(&self) -> Vec<MatchAnalysisRecord> {
        self.lock().analyses.clone()
    }

    pub fn progress(&self, job: &str) -> Option<BatchProgressState> {
        self.lock().progress.get(job).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("investor store mutex poisoned")
    }
}

fn insert_investor(state: &mut MemoryState, investor: NewInvestor) -> InvestorRecord {
    state.next_investor_id += 1;
    let record = investor.into_record(InvestorId(state.next_investor_id));
    state.investors.insert(record.id, record.clone());
    record
}

impl InvestorRepository for InMemoryInvestorStore {
    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock().investors.len())
    }

    fn page(&self, offset: usize, limit: usize) -> Result<Vec<InvestorRecord>, RepositoryError> {
        Ok(self
            .lock()
            .investors
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert(&self, investor: NewInvestor) -> Result<InvestorRecord, RepositoryError> {
        Ok(insert_investor(&mut self.lock(), investor))
    }

    fn fetch(&self, id: InvestorId) -> Result<Option<InvestorRecord>, RepositoryError> {
        Ok(self.lock().investors.get(&id).cloned())
    }
}

impl AnalysisRepository for InMemoryInvestorStore {
    fn insert_many(
        &self,
        analyses: &[MatchAnalysis],
    ) -> Result<Vec<MatchAnalysisRecord>, RepositoryError> {
        let mut state = self.lock();
        let created_at = Utc::now();
        let mut inserted = Vec::with_capacity(analyses.len());
        for analysis in analyses {
            state.next_analysis_id += 1;
            let record = MatchAnalysisRecord {
                id: state.next_analysis_id,
                investor_id: analysis.investor_id,
                score: analysis.score,
                reason: analysis.reason.clone(),
                top_rated: analysis.top_rated,
                created_at,
            };
            state.analyses.push(record.clone());
            inserted.push(record);
        }
        Ok(inserted)
    }

    fn clear(&self) -> Result<usize, RepositoryError> {
        let mut state = self.lock();
        let removed = state.analyses.len();
        state.analyses.clear();
        Ok(removed)
    }

    fn query(&self, query: &AnalysisQuery) -> Result<AnalysisSlice, RepositoryError> {
        Ok(query.select(&self.lock().analyses))
    }
}

impl ProgressRepository for InMemoryInvestorStore {
    fn load(&self, job: &str) -> Result<Option<BatchProgressState>, RepositoryError> {
        Ok(self.progress(job))
    }

    fn upsert(&self, state: &BatchProgressState) -> Result<(), RepositoryError> {
        self.lock()
            .progress
            .insert(state.job.clone(), state.clone());
        Ok(())
    }
}
