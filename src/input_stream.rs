//! Compressed input stream (C9, §4.7).

use crate::barrier::BlockBarrier;
use crate::bitstream::InputBitStream;
use crate::context::Context;
use crate::decoder_task::{self, DecodeResult};
use crate::error::{KanziError, Result};
use crate::header::StreamHeader;
use crate::threadpool::TPool;
use std::io::Read;
use std::sync::{Arc, Mutex};

/// Reads the stream header, dispatches decode tasks with bounded
/// concurrency, and aggregates their output in block order for the reader.
pub struct CompressedInputStream {
    ctx: Context,
    inp: Arc<Mutex<InputBitStream>>,
    barrier: Arc<BlockBarrier>,
    pool: Option<TPool>,
    header: Option<StreamHeader>,
    pending: Vec<u8>,
    pending_pos: usize,
    next_block_id: u64,
    finished: bool,
    closed: bool,
}

impl CompressedInputStream {
    /// §4.7 "Public contract: `new(source, ctx)`".
    pub fn new(source: impl Read + Send + 'static, ctx: Context) -> Result<Self> {
        let ctx = ctx.validated()?;
        let pool = if ctx.jobs > 1 {
            TPool::new(ctx.jobs, ctx.jobs)
        } else {
            None
        };
        Ok(CompressedInputStream {
            inp: Arc::new(Mutex::new(InputBitStream::new(source))),
            barrier: Arc::new(BlockBarrier::new()),
            pool,
            header: None,
            pending: Vec::new(),
            pending_pos: 0,
            next_block_id: 1,
            finished: false,
            closed: false,
            ctx,
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(KanziError::StreamClosed);
        }
        Ok(())
    }

    /// §4.7 "read(buf): fills buf, transparently triggering `process_block`
    /// whenever the aggregated decoded buffer is drained.".
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        loop {
            if self.pending_pos < self.pending.len() {
                let avail = self.pending.len() - self.pending_pos;
                let take = avail.min(buf.len());
                buf[..take].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + take]);
                self.pending_pos += take;
                return Ok(take);
            }
            if self.finished {
                return Ok(0);
            }
            self.process_block()?;
        }
    }

    /// Parses the header on first call, then dispatches up to `jobs`
    /// decode tasks and aggregates their output in block-id order.
    fn process_block(&mut self) -> Result<()> {
        if self.pending_pos > 0 {
            self.pending.drain(0..self.pending_pos);
            self.pending_pos = 0;
        }

        if self.header.is_none() {
            let header = {
                let mut inp = self.inp.lock().expect("input bit stream mutex poisoned");
                StreamHeader::read(&mut inp)?
            };
            // §4.7: "the `nb_input_blocks_hint` may be used to reduce `jobs`
            // when the input has fewer blocks than configured concurrency."
            if header.input_blocks_hint != 0 && (header.input_blocks_hint as usize) < self.ctx.jobs {
                self.ctx.jobs = header.input_blocks_hint as usize;
                self.pool = if self.ctx.jobs > 1 {
                    TPool::new(self.ctx.jobs, self.ctx.jobs)
                } else {
                    None
                };
            }
            self.header = Some(header);
        }

        let header = self.header.clone().expect("header parsed above");
        let jobs = self.ctx.jobs;
        let results: Arc<Mutex<Vec<Option<Result<DecodeResult>>>>> =
            Arc::new(Mutex::new((0..jobs).map(|_| None).collect()));
        let first_id = self.next_block_id;

        for k in 0..jobs {
            let block_id = first_id + k as u64;
            let transforms = header.transforms.clone();
            let entropy = header.entropy;
            let checksum = header.checksum;
            let inp = Arc::clone(&self.inp);
            let barrier = Arc::clone(&self.barrier);
            let results = Arc::clone(&results);
            let job = move || {
                let r = decoder_task::run(block_id, &transforms, entropy, checksum, &inp, &barrier);
                results.lock().expect("decode results mutex poisoned")[k] = Some(r);
            };
            match &self.pool {
                Some(pool) => pool.submit_job(Box::new(job)),
                None => job(),
            }
        }
        if let Some(pool) = &self.pool {
            pool.jobs_completed();
        }

        self.next_block_id += jobs as u64;
        let results = Arc::try_unwrap(results)
            .unwrap_or_else(|arc| Mutex::new(std::mem::take(&mut *arc.lock().unwrap())))
            .into_inner()
            .expect("decode results mutex poisoned");

        for slot in results {
            match slot.expect("every decode task slot is filled before jobs_completed returns") {
                Ok(dr) => {
                    if dr.terminal {
                        self.finished = true;
                        break;
                    }
                    self.pending.extend_from_slice(&dr.data);
                }
                Err(e) => {
                    tracing::error!(%e, "aborting input stream on first decode task error");
                    self.finished = true;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// §4.7 "close(): idempotent; closes the bit stream, releases buffers.".
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.inp
            .lock()
            .expect("input bit stream mutex poisoned")
            .close()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for CompressedInputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
