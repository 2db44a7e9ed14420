use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::backoff::RetryPolicy;
use super::job::{Job, JobOutcome, JobPayload, JobRecord, QueueStats};
use super::rate_limiter::RateLimiter;
use super::worker::ExecutionWorker;
use crate::shared::utils::id_generator::JobIdGenerator;

// =====================================================
// 작업 큐 (Job Queue)
// =====================================================
// 인메모리 FIFO 큐 + 동시성 상한 + 레이트 리밋 + 지수 백오프 재시도
//
// BullMQ의 waiting/active/delayed/completed/failed 모델을 따릅니다.
// 디스패치 루프는 notify(입큐/작업 종료) 또는 주기 틱(지연 작업
// 승격)으로 깨어납니다.
// =====================================================

#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// 동시 활성 작업 상한
    pub concurrency: usize,

    /// 레이트 리밋: 윈도우당 시작 상한
    pub rate_limit_max: usize,

    /// 레이트 리밋 윈도우
    pub rate_limit_window: Duration,

    /// 재시도 정책
    pub retry_policy: RetryPolicy,

    /// 종료 작업 이력 보관 상한 (건수)
    pub history_limit: usize,

    /// 종료 작업 이력 보관 상한 (시간)
    pub history_max_age: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            rate_limit_max: 100,
            rate_limit_window: Duration::from_millis(1000),
            retry_policy: RetryPolicy::default(),
            history_limit: 1000,
            history_max_age: Duration::from_secs(3600),
        }
    }
}

struct QueueState {
    waiting: VecDeque<Job>,

    /// 백오프 대기 중 작업 (due 시각, 작업)
    delayed: Vec<(Instant, Job)>,

    /// 실행 중 작업 ID
    active: HashSet<u64>,

    /// 입큐 멱등성: order_id → job_id
    in_flight_orders: HashMap<u64, u64>,

    /// 종료 작업 이력 (기록 시각 포함, 건수/시간 상한으로 정리)
    history: VecDeque<(Instant, JobRecord)>,

    completed: u64,
    failed: u64,
}

pub struct JobQueue {
    state: Mutex<QueueState>,
    config: QueueConfig,
    limiter: RateLimiter,
    worker: Arc<ExecutionWorker>,
    notify: Notify,
    running: AtomicBool,

    /// 태스크 스폰용 자기 참조 (new_cyclic으로 설정)
    self_ref: Weak<JobQueue>,
}

impl JobQueue {
    pub fn new(config: QueueConfig, worker: Arc<ExecutionWorker>) -> Arc<Self> {
        let limiter = RateLimiter::new(config.rate_limit_max, config.rate_limit_window);
        Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(QueueState {
                waiting: VecDeque::new(),
                delayed: Vec::new(),
                active: HashSet::new(),
                in_flight_orders: HashMap::new(),
                history: VecDeque::new(),
                completed: 0,
                failed: 0,
            }),
            config,
            limiter,
            worker,
            notify: Notify::new(),
            running: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        })
    }

    /// 디스패치 루프 시작
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(queue) = self.self_ref.upgrade() else {
            return;
        };

        println!(
            "[Job Queue] Started (concurrency: {}, rate limit: {}/{}ms, max attempts: {})",
            self.config.concurrency,
            self.config.rate_limit_max,
            self.config.rate_limit_window.as_millis(),
            self.config.retry_policy.max_attempts
        );

        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(50));
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            while queue.running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = queue.notify.notified() => {}
                    _ = tick.tick() => {}
                }

                queue.promote_due_jobs();
                queue.evict_history();
                queue.dispatch();
            }

            println!("[Job Queue] Dispatch loop stopped");
        });
    }

    /// 작업 입큐 (order_id 기준 멱등)
    ///
    /// 이미 대기/실행/백오프 중인 주문이면 기존 작업 ID를 반환합니다.
    pub fn enqueue(&self, payload: JobPayload) -> u64 {
        let job_id = {
            let mut state = self.state.lock();
            if let Some(existing) = state.in_flight_orders.get(&payload.order_id) {
                println!(
                    "[Job Queue] Order {} already in flight (job {})",
                    payload.order_id, existing
                );
                return *existing;
            }

            let job_id = JobIdGenerator::next();
            state.in_flight_orders.insert(payload.order_id, job_id);
            state.waiting.push_back(Job {
                id: job_id,
                order_id: payload.order_id,
                payload,
                attempt: 1,
                enqueued_at: Utc::now(),
            });
            job_id
        };

        self.notify.notify_one();
        job_id
    }

    /// 대기/백오프 중 작업 제거 (실행 중 작업은 중단하지 않음)
    pub fn remove_job(&self, order_id: u64) -> bool {
        let mut state = self.state.lock();

        let before = state.waiting.len();
        state.waiting.retain(|job| job.order_id != order_id);
        let removed_waiting = state.waiting.len() < before;

        let before = state.delayed.len();
        state.delayed.retain(|(_, job)| job.order_id != order_id);
        let removed_delayed = state.delayed.len() < before;

        if removed_waiting || removed_delayed {
            state.in_flight_orders.remove(&order_id);
            println!("[Job Queue] Removed pending job for order {}", order_id);
            true
        } else {
            false
        }
    }

    /// 실패 이력에서 작업을 꺼내 새 시도로 재입큐
    pub fn retry_job(&self, order_id: u64) -> Option<u64> {
        let payload = {
            let state = self.state.lock();
            if state.in_flight_orders.contains_key(&order_id) {
                return None;
            }
            state
                .history
                .iter()
                .rev()
                .find(|(_, record)| {
                    record.order_id == order_id && record.outcome == JobOutcome::Failed
                })
                .map(|(_, record)| record.payload.clone())?
        };

        Some(self.enqueue(payload))
    }

    /// 큐 상태 스냅샷
    pub fn stats(&self) -> QueueStats {
        let state = self.state.lock();
        QueueStats {
            waiting: state.waiting.len(),
            active: state.active.len(),
            completed: state.completed,
            failed: state.failed,
            delayed: state.delayed.len(),
        }
    }

    /// 디스패치 중단. 실행 중 작업은 자연 종료됩니다.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            println!("[Job Queue] Shutting down");
            self.notify.notify_one();
        }
    }

    /// 백오프 만료 작업을 대기열 앞으로 승격
    fn promote_due_jobs(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();

        let mut due = Vec::new();
        state.delayed.retain(|(at, job)| {
            if *at <= now {
                due.push(job.clone());
                false
            } else {
                true
            }
        });

        // 재시도는 신규 주문보다 먼저
        for job in due.into_iter().rev() {
            println!(
                "[Job Queue] Retrying order {} (attempt {})",
                job.order_id, job.attempt
            );
            state.waiting.push_front(job);
        }
    }

    /// 이력 정리 (건수 + 시간 상한)
    fn evict_history(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();

        while state.history.len() > self.config.history_limit {
            state.history.pop_front();
        }
        while let Some((at, _)) = state.history.front() {
            if now.duration_since(*at) > self.config.history_max_age {
                state.history.pop_front();
            } else {
                break;
            }
        }
    }

    /// 여유 슬롯 + 레이트 리밋 허용 범위 내에서 대기 작업 시작
    fn dispatch(&self) {
        let Some(queue) = self.self_ref.upgrade() else {
            return;
        };
        loop {
            let job = {
                let mut state = self.state.lock();
                if state.active.len() >= self.config.concurrency || state.waiting.is_empty() {
                    break;
                }
                if !self.limiter.try_acquire() {
                    break;
                }
                // waiting이 비어있지 않음을 위에서 확인함
                let job = match state.waiting.pop_front() {
                    Some(job) => job,
                    None => break,
                };
                state.active.insert(job.id);
                job
            };

            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue.run_job(job).await;
            });
        }
    }

    async fn run_job(self: Arc<Self>, job: Job) {
        let max_attempts = self.config.retry_policy.max_attempts;
        let result = self
            .worker
            .process(&job.payload, job.attempt, max_attempts)
            .await;

        {
            let mut state = self.state.lock();
            state.active.remove(&job.id);

            match result {
                Ok(_) => {
                    state.in_flight_orders.remove(&job.order_id);
                    state.completed += 1;
                    state.history.push_back((
                        Instant::now(),
                        JobRecord {
                            job_id: job.id,
                            order_id: job.order_id,
                            payload: job.payload,
                            outcome: JobOutcome::Completed,
                            attempts: job.attempt,
                            finished_at: Utc::now(),
                        },
                    ));
                }
                Err(_) if self.config.retry_policy.should_retry(job.attempt) => {
                    let delay = self.config.retry_policy.delay_for(job.attempt);
                    println!(
                        "[Job Queue] Order {} scheduled for retry in {}ms",
                        job.order_id,
                        delay.as_millis()
                    );
                    state.delayed.push((
                        Instant::now() + delay,
                        Job {
                            attempt: job.attempt + 1,
                            ..job
                        },
                    ));
                }
                Err(_) => {
                    state.in_flight_orders.remove(&job.order_id);
                    state.failed += 1;
                    state.history.push_back((
                        Instant::now(),
                        JobRecord {
                            job_id: job.id,
                            order_id: job.order_id,
                            payload: job.payload,
                            outcome: JobOutcome::Failed,
                            attempts: job.attempt,
                            finished_at: Utc::now(),
                        },
                    ));
                }
            }
        }

        self.notify.notify_one();
    }
}
