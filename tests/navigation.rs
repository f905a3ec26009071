//! End-to-end navigation tests through the router handle.

use route_engine::history::{HistoryAction, HistoryLocation};
use route_engine::matches::MatchCause;
use route_engine::router::MatchRouteOptions;
use route_engine::router::RouterStatus;
use route_engine::{
    BuildOptions, LoadError, MatchStatus, Redirect, RouteDef, RouteError, RouterError, RouterEventKind, Value,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod common;

fn teams() -> RouteDef {
    RouteDef::new("teams")
        .loader(|_| async { Ok(Value::from("teams")) })
        .children([
            RouteDef::new("new"),
            RouteDef::new("$teamId").loader(|ctx| async move {
                Ok(ctx.params.get("teamId").cloned().unwrap_or(Value::Null))
            }),
        ])
}

#[tokio::test]
async fn test_static_segment_beats_param() {
    let (router, _) = common::router(RouteDef::root().child(teams()), "/");
    router.load().await;

    router.navigate(BuildOptions::to("/teams/new")).await.unwrap();
    assert_eq!(common::committed_ids(&router), vec!["__root__", "/teams", "/teams/new"]);

    router.navigate(BuildOptions::to("/teams/7")).await.unwrap();
    assert_eq!(common::committed_ids(&router), vec!["__root__", "/teams", "/teams/$teamId7"]);
    assert_eq!(common::data_str(&router, "/teams/$teamId7").as_deref(), Some("7"));
}

#[tokio::test]
async fn test_search_change_keeps_match_identity() {
    let posts = RouteDef::new("posts").loader(|ctx| async move {
        Ok(ctx.search.get("page").cloned().unwrap_or(Value::Null))
    });
    let (router, _) = common::router(RouteDef::root().child(posts), "/");
    router.load().await;

    router
        .navigate(BuildOptions::to("/posts").search(Value::from_pairs([("page", 2)])))
        .await
        .unwrap();
    let first = router.get_match("/posts").unwrap();
    assert_eq!(first.cause, MatchCause::Enter);

    router
        .navigate(BuildOptions::to("/posts").search(Value::from_pairs([("page", 3)])))
        .await
        .unwrap();
    let second = router.get_match("/posts").unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.cause, MatchCause::Stay);
    assert_eq!(second.search.get("page"), Some(&Value::from(3)));
    assert_eq!(router.state().location.search_str, "?page=3");
}

#[tokio::test]
async fn test_loader_redirect_replaces_history_entry() {
    let root = RouteDef::root().children([
        RouteDef::new("login"),
        RouteDef::new("dashboard")
            .loader(|_| async { Err(LoadError::Redirect(Redirect::to("/login"))) }),
    ]);
    let (router, history) = common::router(root, "/");
    router.load().await;

    router.navigate(BuildOptions::to("/dashboard")).await.unwrap();

    let state = router.state();
    assert_eq!(state.location.pathname, "/login");
    assert_eq!(common::committed_ids(&router), vec!["__root__", "/login"]);
    assert!(state.matches.iter().all(|m| m.status != MatchStatus::Error));
    assert_eq!(
        history.writes(),
        vec![
            (HistoryAction::Push, "/dashboard".to_string()),
            (HistoryAction::Replace, "/login".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_newer_navigation_wins() {
    let slow_finished = Arc::new(AtomicBool::new(false));
    let flag = slow_finished.clone();
    let root = RouteDef::root().children([
        RouteDef::new("a").loader(move |_| {
            let flag = flag.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(500)).await;
                flag.store(true, Ordering::SeqCst);
                Ok(Value::from("a"))
            }
        }),
        RouteDef::new("b").loader(|_| async { Ok(Value::from("b")) }),
    ]);
    let (router, _) = common::router(root, "/");
    router.load().await;

    let first = router.build_location(&BuildOptions::to("/a"));
    router.commit_location(&first, false).unwrap();
    router.navigate(BuildOptions::to("/b")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;

    let state = router.state();
    assert_eq!(state.location.pathname, "/b");
    assert_eq!(common::committed_ids(&router), vec!["__root__", "/b"]);
    assert!(router.get_match("/a").is_none());
    assert!(!slow_finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_events_fire_once_per_navigation() {
    let (router, _) = common::router(RouteDef::root().child(teams()), "/");
    router.load().await;

    let counts: Vec<Arc<AtomicUsize>> = (0..3).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let kinds = [RouterEventKind::BeforeLoad, RouterEventKind::Load, RouterEventKind::Resolved];
    let _subs: Vec<_> = kinds
        .iter()
        .zip(&counts)
        .map(|(kind, count)| {
            let count = count.clone();
            router.subscribe(*kind, move |event| {
                assert_eq!(event.to.pathname, "/teams");
                assert!(event.path_changed);
                count.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    router.navigate(BuildOptions::to("/teams")).await.unwrap();

    for count in &counts {
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_lifecycle_hooks() {
    let entered = Arc::new(AtomicUsize::new(0));
    let stayed = Arc::new(AtomicUsize::new(0));
    let left = Arc::new(AtomicUsize::new(0));
    let (e, s, l) = (entered.clone(), stayed.clone(), left.clone());
    let posts = RouteDef::new("posts")
        .on_enter(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .on_stay(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .on_leave(move |_| {
            l.fetch_add(1, Ordering::SeqCst);
        });
    let (router, _) = common::router(RouteDef::root().children([posts, RouteDef::new("about")]), "/");
    router.load().await;

    router.navigate(BuildOptions::to("/posts")).await.unwrap();
    router
        .navigate(BuildOptions::to("/posts").search(Value::from_pairs([("q", "x")])))
        .await
        .unwrap();
    router.navigate(BuildOptions::to("/about")).await.unwrap();

    assert_eq!(entered.load(Ordering::SeqCst), 1);
    assert_eq!(stayed.load(Ordering::SeqCst), 1);
    assert_eq!(left.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let (router, _) = common::router(RouteDef::root().child(teams()), "/");
    router.load().await;

    router.navigate(BuildOptions::to("/nowhere")).await.unwrap();

    let state = router.state();
    assert_eq!(state.status_code, 404);
    assert_eq!(state.matches.len(), 1);
    assert_eq!(state.matches[0].status, MatchStatus::NotFound);
}

#[tokio::test]
async fn test_guard_context_reaches_loader() {
    let root = RouteDef::root()
        .before_load(|_| async { Ok(Some(Value::from_pairs([("user", "ada")]))) })
        .child(RouteDef::new("me").loader(|ctx| async move {
            Ok(ctx.context.get("user").cloned().unwrap_or(Value::Null))
        }));
    let (router, _) = common::router(root, "/");
    router.load().await;

    router.navigate(BuildOptions::to("/me")).await.unwrap();
    assert_eq!(common::data_str(&router, "/me").as_deref(), Some("ada"));
}

#[tokio::test]
async fn test_loader_failure_is_recorded_on_match() {
    let root = RouteDef::root().child(
        RouteDef::new("broken").loader(|_| async { Err(LoadError::Failed("boom".into())) }),
    );
    let (router, _) = common::router(root, "/");
    router.load().await;

    router.navigate(BuildOptions::to("/broken")).await.unwrap();

    let m = router.get_match("/broken").unwrap();
    assert_eq!(m.status, MatchStatus::Error);
    assert!(m.error.unwrap().to_string().contains("boom"));
    assert_eq!(router.state().status_code, 200);
}

#[tokio::test]
async fn test_match_route_reports_active_params() {
    let (router, _) = common::router(RouteDef::root().child(teams()), "/");
    router.load().await;
    router.navigate(BuildOptions::to("/teams/5")).await.unwrap();

    let params = router
        .match_route(&BuildOptions::to("/teams/$teamId"), MatchRouteOptions::default())
        .unwrap();
    assert_eq!(params.get("teamId"), Some(&Value::from("5")));

    assert!(router
        .match_route(&BuildOptions::to("/teams/new"), MatchRouteOptions::default())
        .is_none());
    assert!(router
        .match_route(&BuildOptions::to("/teams"), MatchRouteOptions::default())
        .is_none());
    assert!(router
        .match_route(
            &BuildOptions::to("/teams"),
            MatchRouteOptions {
                fuzzy: true,
                ..Default::default()
            }
        )
        .is_some());
}

#[tokio::test]
async fn test_external_url_is_rejected() {
    let (router, history) = common::router(RouteDef::root(), "/");
    router.load().await;

    let err = router
        .navigate(BuildOptions::to("https://example.com/x"))
        .await
        .unwrap_err();
    assert!(matches!(err, RouterError::ExternalUrl(_)));
    assert!(history.writes().is_empty());
}

#[tokio::test]
async fn test_blocked_navigation_reports_error() {
    let (router, _) = common::router(RouteDef::root().child(teams()), "/");
    router.load().await;
    let _blocker = router.history().block(Arc::new(|_: &HistoryLocation, _: &HistoryLocation| true));

    let err = router.navigate(BuildOptions::to("/teams")).await.unwrap_err();
    assert!(matches!(err, RouterError::Blocked));
    assert_eq!(router.state().location.pathname, "/");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_guard_ends_the_chain() {
    let root = RouteDef::root().child(
        RouteDef::new("g")
            .before_load(|_| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(None)
            })
            .child(RouteDef::new("inner").loader(|_| async { Ok(Value::from("inner")) })),
    );
    let (router, _) = common::router(root, "/");
    router.load().await;

    let navigating = router.clone();
    let task = tokio::spawn(async move { navigating.navigate(BuildOptions::to("/g/inner")).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    router.cancel_match("/g");
    task.await.unwrap().unwrap();

    let state = router.state();
    assert_eq!(state.status, RouterStatus::Idle);
    assert_eq!(common::committed_ids(&router), vec!["__root__", "/g"]);
    let g = router.get_match("/g").unwrap();
    assert_eq!(g.status, MatchStatus::Error);
    assert!(matches!(g.error, Some(RouteError::Cancelled { .. })));
    assert!(state.matches.iter().all(|m| m.status != MatchStatus::Pending));
}
