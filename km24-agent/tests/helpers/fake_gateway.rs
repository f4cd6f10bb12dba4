//! Recording in-memory `PlatformGateway`
//!
//! Answers from canned data and records every call in order, so tests can
//! assert which upstream operations the validator performed.

use async_trait::async_trait;
use km24_agent::platform::{
    CompanyResult, HitsPage, HitsQuery, ModuleSchema, ModuleSummary, PartDescriptor, RawHit,
    Step, StepDraft,
};
use km24_agent::{Error, PlatformGateway, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListModules(bool),
    GetModule(i64),
    CreateStep(StepDraft),
    GetStepHits(i64, HitsQuery),
    DeleteStep(i64),
    SearchCompanies(String),
}

pub struct FakeGateway {
    module: Option<ModuleSchema>,
    step_id: i64,
    hits: HitsPage,
    fail_list: bool,
    fail_create: bool,
    fail_hits: bool,
    stall_hits: bool,
    fail_delete: bool,
    calls: Mutex<Vec<Call>>,
}

/// Module 110 with a single `kommune` part (id 5)
pub fn arbejdstilsyn() -> ModuleSchema {
    ModuleSchema {
        id: 110,
        title: "Arbejdstilsyn".to_string(),
        emoji: "👷".to_string(),
        description: Some("Påbud, forbud og afgørelser".to_string()),
        parts: vec![PartDescriptor {
            id: 5,
            name: "Kommune".to_string(),
            slug: "kommune".to_string(),
            part_type: "municipality".to_string(),
        }],
    }
}

/// `count` numbered raw hits
pub fn raw_hits(count: usize) -> Vec<RawHit> {
    (1..=count)
        .map(|i| RawHit {
            title: Some(format!("Hit {}", i)),
            hit_datetime: Some(format!("2024-05-{:02}T08:00:00Z", i)),
            summary: None,
            description: Some(format!("Description {}", i)),
            url: Some(format!("https://km24.dk/hits/{}", i)),
        })
        .collect()
}

fn upstream(status: u16, message: &str) -> Error {
    Error::Upstream {
        status: Some(status),
        message: message.to_string(),
    }
}

impl FakeGateway {
    /// Module 110, step id 42, five hits
    pub fn new() -> Self {
        Self {
            module: Some(arbejdstilsyn()),
            step_id: 42,
            hits: HitsPage {
                count: 5,
                items: raw_hits(5),
            },
            fail_list: false,
            fail_create: false,
            fail_hits: false,
            stall_hits: false,
            fail_delete: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_module(mut self) -> Self {
        self.module = None;
        self
    }

    pub fn with_hits(mut self, count: u64, items: Vec<RawHit>) -> Self {
        self.hits = HitsPage { count, items };
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn failing_hits(mut self) -> Self {
        self.fail_hits = true;
        self
    }

    /// Hit fetch that never completes
    pub fn stalling_hits(mut self) -> Self {
        self.stall_hits = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<i64> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::DeleteStep(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CreateStep(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlatformGateway for FakeGateway {
    async fn list_modules(&self, force_refresh: bool) -> Result<Arc<Vec<ModuleSummary>>> {
        self.record(Call::ListModules(force_refresh));
        if self.fail_list {
            return Err(upstream(503, "service unavailable"));
        }
        let module = arbejdstilsyn();
        Ok(Arc::new(vec![ModuleSummary {
            id: module.id,
            title: module.title,
            emoji: module.emoji,
            description: module.description,
        }]))
    }

    async fn get_module(&self, module_id: i64) -> Result<ModuleSchema> {
        self.record(Call::GetModule(module_id));
        self.module
            .clone()
            .ok_or_else(|| Error::NotFound(format!("module {}", module_id)))
    }

    async fn create_step(&self, draft: &StepDraft) -> Result<Step> {
        self.record(Call::CreateStep(draft.clone()));
        if self.fail_create {
            return Err(upstream(400, "invalid modulePartId"));
        }
        Ok(Step {
            id: self.step_id,
            name: Some(draft.name.clone()),
        })
    }

    async fn get_step_hits(&self, step_id: i64, query: &HitsQuery) -> Result<HitsPage> {
        self.record(Call::GetStepHits(step_id, query.clone()));
        if self.stall_hits {
            std::future::pending::<()>().await;
        }
        if self.fail_hits {
            return Err(upstream(500, "hits backend failed"));
        }
        Ok(self.hits.clone())
    }

    async fn delete_step(&self, step_id: i64) -> Result<()> {
        self.record(Call::DeleteStep(step_id));
        if self.fail_delete {
            return Err(upstream(500, "delete failed"));
        }
        Ok(())
    }

    async fn search_companies(&self, query: &str) -> Result<Vec<CompanyResult>> {
        self.record(Call::SearchCompanies(query.to_string()));
        Ok(Vec::new())
    }
}
