#![cfg(unix)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use cronx_dispatch::{
    DispatchError, Dispatcher, DispatcherConfig, FailureKind, MemoryTaskLogStore, ORPHAN_RESULT,
    ReconcileOutcome, StopOutcome, StoreError, TaskLogStore,
};
use cronx_model::{TaskKey, TaskLog, TaskLogId, TaskLogStatus, TaskLogUpdate, TaskRequest, WorkerAddr};
use cronx_rpc::{
    ChannelPool, ConnectionPool, PoolError, WorkerClient, WorkerConfig, WorkerService,
    tonic::transport::{Channel, Server},
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

struct TestWorker {
    addr: WorkerAddr,
    shutdown: CancellationToken,
}

impl Drop for TestWorker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn spawn_worker() -> TestWorker {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let service = WorkerService::from_config(&WorkerConfig::default()).unwrap();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        Server::builder()
            .add_service(service.into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                signal.cancelled().await
            })
            .await
            .unwrap();
    });

    TestWorker {
        addr: WorkerAddr::new("127.0.0.1", port),
        shutdown,
    }
}

fn dispatcher_with(store: Arc<dyn TaskLogStore>) -> Dispatcher {
    Dispatcher::from_config(&DispatcherConfig::default(), store).unwrap()
}

fn dispatcher() -> Dispatcher {
    dispatcher_with(Arc::new(MemoryTaskLogStore::new()))
}

async fn wait_registered(dispatcher: &Dispatcher, key: &TaskKey) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !dispatcher.registry().contains(key) {
        assert!(Instant::now() < deadline, "{key} never registered");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_timeout_is_clamped_and_succeeds() {
    let worker = spawn_worker().await;
    let dispatcher = dispatcher();

    let out = dispatcher
        .exec(&worker.addr, &TaskRequest::shell(1, "sleep 1; echo ok", 0))
        .await
        .unwrap();

    assert_eq!(out.trim_end(), "ok");
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_cancels_in_flight_exec_promptly() {
    let worker = spawn_worker().await;
    let dispatcher = dispatcher();
    let key = TaskKey::new(&worker.addr, 1);

    let started = Instant::now();
    let running = {
        let dispatcher = dispatcher.clone();
        let addr = worker.addr.clone();
        tokio::spawn(async move {
            dispatcher
                .exec(&addr, &TaskRequest::shell(1, "sleep 10", 30))
                .await
        })
    };

    wait_registered(&dispatcher, &key).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dispatcher.stop(&worker.addr, 1).await, StopOutcome::Signalled);

    let err = running.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert_eq!(err.to_string(), "manually stopped");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!dispatcher.registry().contains(&key));
}

#[tokio::test(flavor = "multi_thread")]
async fn deadline_is_reported_as_timed_out() {
    let worker = spawn_worker().await;
    let dispatcher = dispatcher();

    let started = Instant::now();
    let err = dispatcher
        .exec(&worker.addr, &TaskRequest::shell(2, "sleep 10", 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::TimedOut);
    assert_eq!(err.to_string(), "execution timed out, forcibly ended");
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn logical_failure_keeps_partial_output() {
    let worker = spawn_worker().await;
    let dispatcher = dispatcher();

    let err = dispatcher
        .exec(&worker.addr, &TaskRequest::shell(3, "echo partial; exit 3", 10))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Logical);
    assert_eq!(err.to_string(), "exit status 3");
    assert_eq!(err.output(), "partial\n");
    assert!(!err.is_transport());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_worker_is_remote_unavailable() {
    let dispatcher = dispatcher();
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr = WorkerAddr::new("127.0.0.1", port);

    let err = dispatcher
        .exec(&addr, &TaskRequest::shell(4, "echo never", 5))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::Connect(_)), "{err:?}");
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    assert!(dispatcher.registry().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_tasks_do_not_share_cancellation() {
    let worker = spawn_worker().await;
    let dispatcher = dispatcher();

    let spawn_exec = |id: i64| {
        let dispatcher = dispatcher.clone();
        let addr = worker.addr.clone();
        tokio::spawn(async move {
            dispatcher
                .exec(&addr, &TaskRequest::shell(id, "sleep 10", 30))
                .await
        })
    };
    let first = spawn_exec(10);
    let second = spawn_exec(11);

    wait_registered(&dispatcher, &TaskKey::new(&worker.addr, 10)).await;
    wait_registered(&dispatcher, &TaskKey::new(&worker.addr, 11)).await;

    dispatcher.stop(&worker.addr, 10).await;
    let err = first.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), FailureKind::Cancelled);

    assert!(!second.is_finished());
    assert!(dispatcher.registry().contains(&TaskKey::new(&worker.addr, 11)));

    dispatcher.stop(&worker.addr, 11).await;
    let err = second.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert!(dispatcher.registry().is_empty());
}

#[derive(Default)]
struct RecordingStore {
    inner: MemoryTaskLogStore,
    updates: AtomicUsize,
}

#[async_trait]
impl TaskLogStore for RecordingStore {
    async fn update(&self, id: TaskLogId, update: TaskLogUpdate) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, update).await
    }

    async fn status(&self, id: TaskLogId) -> Result<Option<TaskLogStatus>, StoreError> {
        self.inner.status(id).await
    }
}

#[tokio::test]
async fn stop_without_handle_reconciles_exactly_once() {
    let store = Arc::new(RecordingStore::default());
    store.inner.insert(TaskLog::running(42));
    let dispatcher = dispatcher_with(store.clone());

    let outcome = dispatcher.stop(&WorkerAddr::new("10.0.0.9", 5921), 42).await;

    assert_eq!(outcome, StopOutcome::Reconciled(ReconcileOutcome::Updated));
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    let log = store.inner.get(42).unwrap();
    assert_eq!(log.status, TaskLogStatus::Cancel);
    assert_eq!(log.result, ORPHAN_RESULT);
}

#[tokio::test]
async fn stop_for_unknown_log_does_not_fail() {
    let store = Arc::new(RecordingStore::default());
    let dispatcher = dispatcher_with(store.clone());

    let outcome = dispatcher.stop(&WorkerAddr::new("10.0.0.9", 5921), 7).await;

    assert_eq!(outcome, StopOutcome::Reconciled(ReconcileOutcome::NotFound));
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

struct PanickingPool;

#[async_trait]
impl ConnectionPool for PanickingPool {
    async fn get(&self, _: &WorkerAddr) -> Result<WorkerClient<Channel>, PoolError> {
        panic!("pool exploded");
    }

    fn evict(&self, _: &WorkerAddr) {}
}

#[tokio::test]
async fn internal_fault_is_contained() {
    let dispatcher = Dispatcher::new(
        Arc::new(PanickingPool),
        Arc::new(MemoryTaskLogStore::new()),
        &DispatcherConfig::default(),
    );

    let err = dispatcher
        .exec(&WorkerAddr::new("127.0.0.1", 1), &TaskRequest::shell(5, "true", 5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Internal);
    assert!(err.to_string().contains("pool exploded"));
    assert!(dispatcher.registry().is_empty());
}

/// Delegates to a real pool and counts evictions.
struct CountingPool {
    inner: ChannelPool,
    evictions: AtomicUsize,
}

#[async_trait]
impl ConnectionPool for CountingPool {
    async fn get(&self, addr: &WorkerAddr) -> Result<WorkerClient<Channel>, PoolError> {
        self.inner.get(addr).await
    }

    fn evict(&self, addr: &WorkerAddr) {
        self.evictions.fetch_add(1, Ordering::SeqCst);
        self.inner.evict(addr);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_worker_is_evicted_but_failures_are_not() {
    let worker = spawn_worker().await;
    let pool = Arc::new(CountingPool {
        inner: ChannelPool::default(),
        evictions: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::new(
        pool.clone(),
        Arc::new(MemoryTaskLogStore::new()),
        &DispatcherConfig::default(),
    );

    let err = dispatcher
        .exec(&worker.addr, &TaskRequest::shell(6, "exit 1", 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Logical);
    assert_eq!(pool.evictions.load(Ordering::SeqCst), 0);
    assert_eq!(pool.inner.len(), 1);

    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        WorkerAddr::new("127.0.0.1", listener.local_addr().unwrap().port())
    };
    let err = dispatcher
        .exec(&dead, &TaskRequest::shell(7, "true", 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    assert_eq!(pool.evictions.load(Ordering::SeqCst), 1);
}
