//! 工作任务结果汇总
//!
//! 工作任务不直接锁共享集合，而是把 [`WorkerOutcome`] 发送给唯一的汇总任务，
//! 汇总顺序即结果到达顺序。

use super::types::{FailureStage, FileFailure, WorkerOutcome};
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

/// 汇总结果
#[derive(Debug)]
pub struct Aggregate<T> {
    /// 成功的结果，按到达顺序排列
    pub items: Vec<T>,
    /// 失败记录
    pub failures: Vec<FileFailure>,
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            failures: Vec::new(),
        }
    }
}

/// 汇总任务，拥有结果集合的唯一所有权
pub struct Aggregator<T> {
    tx: mpsc::UnboundedSender<WorkerOutcome<T>>,
    task: JoinHandle<Aggregate<T>>,
}

/// 工作任务持有的上报端
pub struct Reporter<T> {
    tx: mpsc::UnboundedSender<WorkerOutcome<T>>,
}

impl<T> Clone for Reporter<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send + 'static> Aggregator<T> {
    /// 在当前运行时上启动汇总任务
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerOutcome<T>>();
        let task = tokio::spawn(async move {
            let mut aggregate = Aggregate::default();
            while let Some(outcome) = rx.recv().await {
                match outcome {
                    WorkerOutcome::Completed(item) => aggregate.items.push(item),
                    WorkerOutcome::Failed(failure) => {
                        aggregate.failures.push(failure)
                    }
                }
            }
            aggregate
        });
        Self { tx, task }
    }

    pub fn reporter(&self) -> Reporter<T> {
        Reporter {
            tx: self.tx.clone(),
        }
    }

    /// 关闭上报通道并等待汇总完成
    ///
    /// 必须在所有 [`Reporter`] 被丢弃之后调用，否则会一直等待。
    pub async fn finish(self) -> Result<Aggregate<T>> {
        drop(self.tx);
        Ok(self.task.await?)
    }
}

impl<T> Reporter<T> {
    pub fn report(&self, outcome: WorkerOutcome<T>) {
        if self.tx.send(outcome).is_err() {
            #[cfg(feature = "logging")]
            tracing::warn!("汇总任务已退出，结果被丢弃");
        }
    }
}

/// 每个输入一个阻塞工作任务，全部结束后返回汇总结果
///
/// panic 的工作任务记为 `stage` 阶段的失败。
pub async fn fan_out_blocking<I, T, F>(
    inputs: Vec<I>,
    stage: FailureStage,
    work: F,
) -> Result<Aggregate<T>>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> WorkerOutcome<T> + Send + Sync + 'static,
{
    let aggregator = Aggregator::spawn();
    let work = Arc::new(work);
    let mut workers = JoinSet::new();

    for input in inputs {
        let reporter = aggregator.reporter();
        let work = Arc::clone(&work);
        workers.spawn_blocking(move || reporter.report(work(input)));
    }

    #[cfg(feature = "logging")]
    tracing::debug!("{:?} 阶段启动 {} 个工作任务", stage, workers.len());

    let mut panicked = Vec::new();
    while let Some(joined) = workers.join_next().await {
        if let Err(e) = joined {
            #[cfg(feature = "logging")]
            tracing::error!("{:?} 阶段工作任务 panic: {}", stage, e);
            panicked.push(FileFailure::new(stage, None, e.to_string()));
        }
    }

    let mut aggregate = aggregator.finish().await?;
    aggregate.failures.extend(panicked);
    Ok(aggregate)
}
