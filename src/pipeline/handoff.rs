//! 有界交接通道
//!
//! 在 `crossbeam_channel::bounded` 之上记录缓冲深度峰值和“发送时已满”的次数，
//! 用于观察背压是否生效。

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 创建容量为 `capacity` 的有界交接通道
pub fn bounded<T>(capacity: usize) -> (HandoffSender<T>, Receiver<T>, HandoffGauge) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    let gauge = HandoffGauge {
        peak: Arc::new(AtomicUsize::new(0)),
        full_sends: Arc::new(AtomicUsize::new(0)),
    };
    let sender = HandoffSender {
        tx,
        gauge: gauge.clone(),
    };
    (sender, rx, gauge)
}

/// 交接通道的发送端，缓冲满时阻塞
pub struct HandoffSender<T> {
    tx: Sender<T>,
    gauge: HandoffGauge,
}

impl<T> HandoffSender<T> {
    /// 发送一个单元，接收端已关闭时原样返回
    pub fn send(&self, item: T) -> Result<(), T> {
        if self.tx.is_full() {
            self.gauge.full_sends.fetch_add(1, Ordering::Relaxed);
        }
        self.tx.send(item).map_err(|e| e.into_inner())?;
        self.gauge.peak.fetch_max(self.tx.len(), Ordering::Relaxed);
        Ok(())
    }
}

/// 交接通道的观测值，可在发送端关闭后读取
#[derive(Debug, Clone)]
pub struct HandoffGauge {
    peak: Arc<AtomicUsize>,
    full_sends: Arc<AtomicUsize>,
}

impl HandoffGauge {
    /// 观察到的最大缓冲深度
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    /// 发送时缓冲已满（需要等待）的次数
    pub fn full_sends(&self) -> usize {
        self.full_sends.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_peak_never_exceeds_capacity() {
        let (tx, rx, gauge) = bounded::<usize>(3);
        let producer = thread::spawn(move || {
            for i in 0..20 {
                tx.send(i).unwrap();
            }
        });

        thread::sleep(Duration::from_millis(50));
        let received: Vec<_> = rx.iter().collect();
        producer.join().unwrap();

        assert_eq!(received, (0..20).collect::<Vec<_>>());
        assert!(gauge.peak() <= 3);
        assert_eq!(gauge.peak(), 3);
        assert!(gauge.full_sends() > 0);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (tx, rx, _gauge) = bounded::<u8>(1);
        drop(rx);
        assert_eq!(tx.send(7), Err(7));
    }
}
