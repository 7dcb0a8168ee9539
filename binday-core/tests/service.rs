//! `BindayService` wiring with an in-memory schedule port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use binday_core::{
    BindayService, Category, CategoryMap, CouncilId, CouncilMeta, CouncilPlugin, CouncilRegistry,
    NormalizeError, Normalizer, PortError, PropertyRef, RawServiceRecord, SchedulePort,
};

struct FixedPort {
    meta: CouncilMeta,
    records: Vec<RawServiceRecord>,
}

#[async_trait]
impl SchedulePort for FixedPort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn services(&self, property: &PropertyRef) -> Result<Vec<RawServiceRecord>, PortError> {
        if property.0 == "0" {
            return Err(PortError::InvalidPropertyRef(property.0.clone()));
        }
        Ok(self.records.clone())
    }
}

fn record(service: &str, next: &str) -> RawServiceRecord {
    RawServiceRecord {
        service: service.to_owned(),
        last_collected: None,
        next_collection: Some(next.to_owned()),
        attributes: serde_json::Map::new(),
    }
}

fn service_with(records: Vec<RawServiceRecord>) -> BindayService {
    let meta = CouncilMeta {
        id: CouncilId("testshire".to_owned()),
        name: "Testshire".to_owned(),
    };
    let categories = CategoryMap::from_pairs([("REFUSE", "blackbin"), ("RECYCLING", "box")])
        .expect("valid category map");
    let plugin = CouncilPlugin {
        meta: meta.clone(),
        schedule_port: Arc::new(FixedPort { meta, records }),
        normalizer: Normalizer::new(categories, Vec::new()).expect("valid normalizer"),
    };
    BindayService::new(Arc::new(CouncilRegistry::new(vec![plugin])))
}

#[tokio::test]
async fn collections_for_fetches_then_normalizes() {
    let service = service_with(vec![
        record("REFUSE", "2024-05-10"),
        record("RECYCLING", "2024-05-03"),
    ]);

    let schedule = service
        .collections_for(
            &CouncilId("testshire".to_owned()),
            &PropertyRef("100050535540".to_owned()),
        )
        .await
        .expect("schedule loads");

    assert_eq!(schedule.next_collection, NaiveDate::from_ymd_opt(2024, 5, 3));
    assert_eq!(schedule.next_collection_categories, vec![Category::from("box")]);
}

#[tokio::test]
async fn unknown_council_is_rejected() {
    let service = service_with(Vec::new());

    let result = service
        .collections_for(&CouncilId("york".to_owned()), &PropertyRef("1".to_owned()))
        .await;

    assert!(
        matches!(result, Err(PortError::UnsupportedCouncil)),
        "expected UnsupportedCouncil, got: {result:?}"
    );
}

#[tokio::test]
async fn unmapped_service_surfaces_as_normalize_error() {
    let service = service_with(vec![
        record("REFUSE", "2024-05-10"),
        record("GLASS", "2024-05-03"),
    ]);

    let result = service
        .collections_for(&CouncilId("testshire".to_owned()), &PropertyRef("1".to_owned()))
        .await;

    assert!(
        matches!(result, Err(PortError::Normalize(NormalizeError::UnknownService(ref id))) if id == "GLASS"),
        "expected UnknownService, got: {result:?}"
    );
}

#[tokio::test]
async fn port_errors_propagate() {
    let service = service_with(Vec::new());

    let result = service
        .collections_for(&CouncilId("testshire".to_owned()), &PropertyRef("0".to_owned()))
        .await;

    assert!(matches!(result, Err(PortError::InvalidPropertyRef(_))));
}

#[test]
fn councils_lists_registered_plugins() {
    let service = service_with(Vec::new());

    assert_eq!(
        service.councils(),
        vec![(CouncilId("testshire".to_owned()), "Testshire".to_owned())]
    );
}
