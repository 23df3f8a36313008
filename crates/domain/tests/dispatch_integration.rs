//! Integration tests for the dispatch assignment engine.

mod common;

use common::{available_driver, load_in, TestEnv, PICKUP};
use domain::error::DomainError;
use domain::models::{
    AcceptDispatchRequest, AssignDispatchRequest, AutoMatchRequest, AvailabilityStatus,
    ChangeStatusRequest, DispatchMethod, DispatchStatus, LoadStatus, RejectDispatchRequest,
};
use domain::repositories::DriverAvailabilityRepository;
use uuid::Uuid;

fn assign_request(load_id: Uuid, driver_id: Uuid) -> AssignDispatchRequest {
    AssignDispatchRequest {
        load_id,
        driver_id,
        tractor_id: None,
        trailer_id: None,
        method: DispatchMethod::Manual,
        assigned_by: "dispatcher.amy".to_string(),
    }
}

fn accept_request() -> AcceptDispatchRequest {
    AcceptDispatchRequest {
        actor: "driver.bob".to_string(),
    }
}

async fn advance(env: &TestEnv, load_id: Uuid, statuses: &[LoadStatus]) {
    for status in statuses {
        env.load_status
            .change_status(
                load_id,
                ChangeStatusRequest {
                    new_status: *status,
                    changed_by: "system".to_string(),
                    automatic: true,
                    reason: None,
                    latitude: None,
                    longitude: None,
                },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_assign_creates_pending_dispatch_and_advances_load() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();

    assert_eq!(dispatch.status, DispatchStatus::Pending);
    assert_eq!(dispatch.method, DispatchMethod::Manual);
    assert!(dispatch.scores.is_none());

    let load = env.load_status.get(load_id).await.unwrap();
    assert_eq!(load.status, LoadStatus::Assigned);
    assert_eq!(load.driver_id, Some(driver_id));

    // The engine-driven status change is flagged automatic in the audit trail
    let trail = env.load_status.history(load_id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert!(trail[0].automatic);
}

#[tokio::test]
async fn test_second_active_dispatch_for_load_conflicts() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let first = available_driver();
    let second = available_driver();
    let first_id = first.driver_id;
    let second_id = second.driver_id;
    env.availability.seed(first);
    env.availability.seed(second);

    env.dispatch
        .assign(assign_request(load_id, first_id))
        .await
        .unwrap();

    let err = env
        .dispatch
        .assign(assign_request(load_id, second_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn test_assign_to_busy_driver_is_rejected() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);

    let mut driver = available_driver();
    driver.status = AvailabilityStatus::OnDuty;
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let err = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DriverUnavailable(_)));
}

#[tokio::test]
async fn test_driver_requested_overrides_availability_gate() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);

    let mut driver = available_driver();
    driver.status = AvailabilityStatus::OffDuty;
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let mut request = assign_request(load_id, driver_id);
    request.method = DispatchMethod::DriverRequested;
    let dispatch = env.dispatch.assign(request).await.unwrap();
    assert_eq!(dispatch.method, DispatchMethod::DriverRequested);
}

#[tokio::test]
async fn test_assign_requires_assignable_load_status() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::Draft);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let err = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_auto_match_prefers_closer_driver() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);

    // Same performance and hours; only proximity differs.
    let near = available_driver();
    let near_id = near.driver_id;
    env.availability.seed(near);

    let mut far = available_driver();
    far.current_latitude = Some(PICKUP.0 + 3.0);
    env.availability.seed(far);

    let dispatch = env
        .dispatch
        .auto_match(AutoMatchRequest {
            load_id,
            requested_by: "dispatcher.amy".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(dispatch.driver_id, near_id);
    assert_eq!(dispatch.method, DispatchMethod::AutoMatched);
    let scores = dispatch.scores.expect("auto-match records scores");
    assert!(scores.total_score > 0.0);
    assert!(scores.proximity_score > 0.0);
}

#[tokio::test]
async fn test_auto_match_with_no_available_drivers() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);

    let err = env
        .dispatch
        .auto_match(AutoMatchRequest {
            load_id,
            requested_by: "dispatcher.amy".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DriverUnavailable(_)));
}

#[tokio::test]
async fn test_accept_advances_load_and_marks_driver_on_duty() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();

    let accepted = env
        .dispatch
        .accept(dispatch.dispatch_id, accept_request())
        .await
        .unwrap();
    assert_eq!(accepted.status, DispatchStatus::Accepted);
    assert!(accepted.accepted_at.is_some());

    let load = env.load_status.get(load_id).await.unwrap();
    assert_eq!(load.status, LoadStatus::Dispatched);

    let availability = env.availability.get(driver_id).await.unwrap().unwrap();
    assert_eq!(availability.status, AvailabilityStatus::OnDuty);
}

#[tokio::test]
async fn test_accept_on_held_load_leaves_dispatch_pending() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();

    // The load goes on hold before the driver responds
    env.load_status
        .change_status(
            load_id,
            ChangeStatusRequest {
                new_status: LoadStatus::OnHold,
                changed_by: "dispatcher.amy".to_string(),
                automatic: false,
                reason: Some("Dock closed".to_string()),
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();

    let err = env
        .dispatch
        .accept(dispatch.dispatch_id, accept_request())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));

    // The failed load transition must not leave a half-accepted dispatch
    let pending = env.dispatch.get(dispatch.dispatch_id).await.unwrap();
    assert_eq!(pending.status, DispatchStatus::Pending);
    assert!(pending.accepted_at.is_none());

    let availability = env.availability.get(driver_id).await.unwrap().unwrap();
    assert_eq!(availability.status, AvailabilityStatus::Available);

    // Once the hold lifts the same dispatch can still be accepted
    env.load_status
        .change_status(
            load_id,
            ChangeStatusRequest {
                new_status: LoadStatus::Assigned,
                changed_by: "dispatcher.amy".to_string(),
                automatic: false,
                reason: Some("Hold released".to_string()),
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();

    let accepted = env
        .dispatch
        .accept(dispatch.dispatch_id, accept_request())
        .await
        .unwrap();
    assert_eq!(accepted.status, DispatchStatus::Accepted);

    let load = env.load_status.get(load_id).await.unwrap();
    assert_eq!(load.status, LoadStatus::Dispatched);
}

#[tokio::test]
async fn test_reject_frees_load_for_reassignment() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let first = available_driver();
    let second = available_driver();
    let first_id = first.driver_id;
    let second_id = second.driver_id;
    env.availability.seed(first);
    env.availability.seed(second);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, first_id))
        .await
        .unwrap();

    let rejected = env
        .dispatch
        .reject(
            dispatch.dispatch_id,
            RejectDispatchRequest {
                actor: "driver.bob".to_string(),
                reason: "Home time scheduled".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, DispatchStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Home time scheduled"));

    // The load stays Assigned and takes a fresh dispatch
    let load = env.load_status.get(load_id).await.unwrap();
    assert_eq!(load.status, LoadStatus::Assigned);

    let second_dispatch = env
        .dispatch
        .assign(assign_request(load_id, second_id))
        .await
        .unwrap();
    assert_eq!(second_dispatch.status, DispatchStatus::Pending);
}

#[tokio::test]
async fn test_complete_before_delivery_is_premature() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();
    env.dispatch
        .accept(dispatch.dispatch_id, accept_request())
        .await
        .unwrap();
    env.dispatch.begin(dispatch.dispatch_id).await.unwrap();

    advance(
        &env,
        load_id,
        &[
            LoadStatus::DriverEnRoute,
            LoadStatus::AtPickup,
            LoadStatus::Loading,
            LoadStatus::PickedUp,
            LoadStatus::InTransit,
        ],
    )
    .await;

    let err = env.dispatch.complete(dispatch.dispatch_id).await.unwrap_err();
    assert!(matches!(err, DomainError::PrematureCompletion(_)));
}

#[tokio::test]
async fn test_complete_after_delivery_frees_driver() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    let loads_before = driver.completed_loads;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();
    env.dispatch
        .accept(dispatch.dispatch_id, accept_request())
        .await
        .unwrap();
    env.dispatch.begin(dispatch.dispatch_id).await.unwrap();

    advance(
        &env,
        load_id,
        &[
            LoadStatus::DriverEnRoute,
            LoadStatus::AtPickup,
            LoadStatus::Loading,
            LoadStatus::PickedUp,
            LoadStatus::InTransit,
            LoadStatus::AtDelivery,
            LoadStatus::Unloading,
            LoadStatus::Delivered,
        ],
    )
    .await;

    let completed = env.dispatch.complete(dispatch.dispatch_id).await.unwrap();
    assert_eq!(completed.status, DispatchStatus::Completed);

    let availability = env.availability.get(driver_id).await.unwrap().unwrap();
    assert_eq!(availability.status, AvailabilityStatus::Available);
    assert_eq!(availability.completed_loads, loads_before + 1);
}

#[tokio::test]
async fn test_begin_requires_accepted() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();

    let err = env.dispatch.begin(dispatch.dispatch_id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_cancelled_load_cancels_active_dispatch() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();

    env.load_status
        .change_status(
            load_id,
            ChangeStatusRequest {
                new_status: LoadStatus::Cancelled,
                changed_by: "dispatcher.amy".to_string(),
                automatic: false,
                reason: Some("Customer cancelled".to_string()),
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();

    let dispatch = env.dispatch.get(dispatch.dispatch_id).await.unwrap();
    assert_eq!(dispatch.status, DispatchStatus::Cancelled);
}

#[tokio::test]
async fn test_cancel_terminal_dispatch_is_invalid() {
    let env = TestEnv::new();
    let load = load_in(LoadStatus::AwaitingAssignment);
    let load_id = load.load_id;
    env.loads.seed(load);
    let driver = available_driver();
    let driver_id = driver.driver_id;
    env.availability.seed(driver);

    let dispatch = env
        .dispatch
        .assign(assign_request(load_id, driver_id))
        .await
        .unwrap();
    env.dispatch.cancel(dispatch.dispatch_id).await.unwrap();

    let err = env.dispatch.cancel(dispatch.dispatch_id).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_get_unknown_dispatch_is_not_found() {
    let env = TestEnv::new();
    let err = env.dispatch.get(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
}
