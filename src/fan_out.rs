//! Runs a [`RecordScanner`] over a batch of records on a dedicated rayon pool.
//!
//! Records are independent, so workers share nothing but the scanner itself.
//! Result `i` always belongs to record `i`, whatever the thread count. A batch
//! either succeeds as a whole or fails with the error of its first failing
//! record (in record order).

use crate::{
    error::ScanError, motif_engine::RecordScanner, parameters::ScanParameters,
    sequence_record::SequenceRecord,
};
use log::debug;
use motifscan_protocol::MotifMatch;
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub struct FanOut {
    pool: rayon::ThreadPool,
}

impl FanOut {
    pub fn new(parameters: &ScanParameters) -> Result<Self, ScanError> {
        parameters.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parameters.threads.unwrap_or(0))
            .stack_size(parameters.worker_stack_size)
            .thread_name(|i| format!("motifscan-worker-{i}"))
            .build()
            .map_err(|e| ScanError::worker(format!("Could not start worker pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn scan_batch<S: RecordScanner>(
        &self,
        scanner: &S,
        records: &[SequenceRecord],
    ) -> Result<Vec<Vec<MotifMatch>>, ScanError> {
        debug!(
            "Scanning {} records on {} threads",
            records.len(),
            self.threads()
        );
        let results: Vec<Result<Vec<MotifMatch>, ScanError>> = self.pool.install(|| {
            records
                .par_iter()
                .map(|record| scan_guarded(scanner, record))
                .collect()
        });
        results.into_iter().collect()
    }
}

/// Scanner errors pass through as they are; a panic inside the scanner
/// becomes a worker error for that record.
fn scan_guarded<S: RecordScanner>(
    scanner: &S,
    record: &SequenceRecord,
) -> Result<Vec<MotifMatch>, ScanError> {
    match catch_unwind(AssertUnwindSafe(|| scanner.scan_record(record))) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ScanError::worker(format!(
                "Worker panicked on '{}': {reason}",
                record.id()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorCode, motif_engine::MotifEngine};

    fn parameters(threads: usize) -> ScanParameters {
        ScanParameters {
            threads: Some(threads),
            ..Default::default()
        }
    }

    fn records(count: usize) -> Vec<SequenceRecord> {
        let mut x: u64 = 0x9e37_79b9;
        (0..count)
            .map(|i| {
                let seq: Vec<u8> = (0..300)
                    .map(|_| {
                        x ^= x << 13;
                        x ^= x >> 7;
                        x ^= x << 17;
                        b"ACGTGGGA"[(x % 8) as usize]
                    })
                    .collect();
                SequenceRecord::new(format!("seq{i}"), seq)
            })
            .collect()
    }

    struct FailOn(&'static str);

    impl RecordScanner for FailOn {
        fn scan_record(&self, record: &SequenceRecord) -> Result<Vec<MotifMatch>, ScanError> {
            if record.id() == self.0 {
                return Err(ScanError::invalid_input("refused"));
            }
            Ok(vec![MotifMatch::from_span(
                "Id",
                record.id().as_bytes(),
                0,
                record.id().len(),
            )])
        }
    }

    struct PanicOn(&'static str);

    impl RecordScanner for PanicOn {
        fn scan_record(&self, record: &SequenceRecord) -> Result<Vec<MotifMatch>, ScanError> {
            if record.id() == self.0 {
                panic!("boom");
            }
            Ok(vec![])
        }
    }

    #[test]
    fn test_one_and_many_threads_agree() {
        let records = records(24);
        let engine = MotifEngine::new();
        let single = FanOut::new(&parameters(1)).unwrap();
        let many = FanOut::new(&parameters(4)).unwrap();
        assert_eq!(single.threads(), 1);
        assert_eq!(many.threads(), 4);
        let a = single.scan_batch(&engine, &records).unwrap();
        let b = many.scan_batch(&engine, &records).unwrap();
        assert_eq!(a.len(), records.len());
        assert_eq!(a, b);
        assert_eq!(a[5], engine.scan_sequence(records[5].sequence()));
    }

    #[test]
    fn test_results_follow_record_order() {
        let records = records(50);
        let results = FanOut::new(&parameters(8))
            .unwrap()
            .scan_batch(&FailOn("none"), &records)
            .unwrap();
        for (record, matches) in records.iter().zip(results.iter()) {
            assert_eq!(matches[0].matched, record.id());
        }
    }

    #[test]
    fn test_failing_record_fails_batch() {
        let records = records(10);
        let err = FanOut::new(&parameters(3))
            .unwrap()
            .scan_batch(&FailOn("seq7"), &records)
            .unwrap_err();
        assert_eq!(err, ScanError::invalid_input("refused"));
    }

    #[test]
    fn test_first_failing_record_wins() {
        struct FailFrom(usize);

        impl RecordScanner for FailFrom {
            fn scan_record(
                &self,
                record: &SequenceRecord,
            ) -> Result<Vec<MotifMatch>, ScanError> {
                match record.id()[3..].parse::<usize>() {
                    Ok(i) if i >= self.0 => Err(ScanError::invalid_input(record.id())),
                    _ => Ok(vec![]),
                }
            }
        }

        let records = records(40);
        for threads in [1, 4] {
            let err = FanOut::new(&parameters(threads))
                .unwrap()
                .scan_batch(&FailFrom(11), &records)
                .unwrap_err();
            assert_eq!(err, ScanError::invalid_input("seq11"));
        }
    }

    #[test]
    fn test_panic_becomes_worker_error() {
        let records = records(6);
        let err = FanOut::new(&parameters(2))
            .unwrap()
            .scan_batch(&PanicOn("seq2"), &records)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Worker);
        assert!(err.message.contains("seq2"));
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_empty_batch() {
        let fan_out = FanOut::new(&ScanParameters::default()).unwrap();
        assert!(fan_out.threads() >= 1);
        let results = fan_out.scan_batch(&MotifEngine::new(), &[]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(FanOut::new(&parameters(0)).is_err());
    }
}
