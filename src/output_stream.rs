//! Compressed output stream (C8, §4.6).

use crate::barrier::BlockBarrier;
use crate::bitstream::OutputBitStream;
use crate::consts::COPY_BLOCK_MASK;
use crate::context::Context;
use crate::encoder_task;
use crate::error::{KanziError, Result};
use crate::header::StreamHeader;
use crate::threadpool::TPool;
use crate::transform::parse_name;
use std::sync::{Arc, Mutex};

/// Buffers user writes, slices them into blocks, and dispatches encode
/// tasks with bounded concurrency onto a single shared bit stream.
pub struct CompressedOutputStream {
    ctx: Context,
    out: Arc<Mutex<OutputBitStream>>,
    barrier: Arc<BlockBarrier>,
    pool: Option<TPool>,
    staging: Vec<u8>,
    staging_limit: usize,
    header_written: bool,
    next_block_id: u64,
    closed: bool,
}

impl CompressedOutputStream {
    /// §4.6 "Public contract: `new(sink, ctx)`".
    pub fn new(sink: impl std::io::Write + Send + 'static, ctx: Context) -> Result<Self> {
        let ctx = ctx.validated()?;
        let pool = if ctx.jobs > 1 {
            TPool::new(ctx.jobs, ctx.jobs)
        } else {
            None
        };
        Ok(CompressedOutputStream {
            staging_limit: ctx.block_size as usize,
            out: Arc::new(Mutex::new(OutputBitStream::new(sink))),
            barrier: Arc::new(BlockBarrier::new()),
            pool,
            staging: Vec::with_capacity(ctx.block_size as usize),
            header_written: false,
            next_block_id: 1,
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

    /// §4.6 "write(buf): appends bytes to the staging buffer. When full,
    /// invokes `process_block(force=false)`...".
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        let max_limit = self.ctx.jobs * self.ctx.block_size as usize;
        let mut offset = 0;
        while offset < buf.len() {
            let room = self.staging_limit.saturating_sub(self.staging.len());
            if room == 0 {
                if self.staging_limit < max_limit {
                    self.staging_limit =
                        (self.staging_limit + self.ctx.block_size as usize).min(max_limit);
                    continue;
                }
                self.process_block(false)?;
                continue;
            }
            let take = room.min(buf.len() - offset);
            self.staging.extend_from_slice(&buf[offset..offset + take]);
            offset += take;
        }
        Ok(buf.len())
    }

    /// §4.6 "Dispatch" steps 1-5.
    fn process_block(&mut self, force: bool) -> Result<()> {
        if self.staging.is_empty() && !force {
            return Ok(());
        }

        if !self.header_written {
            let header = StreamHeader {
                checksum: self.ctx.checksum,
                entropy: self.ctx.entropy,
                transforms: parse_name(&self.ctx.transform)?,
                block_size: self.ctx.block_size,
                input_blocks_hint: self.ctx.input_blocks_hint(),
            };
            header.write(&mut self.out.lock().expect("output bit stream mutex poisoned"))?;
            self.header_written = true;
        }

        let block_size = self.ctx.block_size as usize;
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut pos = 0;
        while pos < self.staging.len() {
            let end = (pos + block_size).min(self.staging.len());
            blocks.push(self.staging[pos..end].to_vec());
            pos = end;
        }
        self.staging.clear();
        self.staging_limit = block_size;

        if blocks.is_empty() {
            return Ok(());
        }

        let first_id = self.next_block_id;
        self.next_block_id += blocks.len() as u64;

        let first_error: Arc<Mutex<Option<KanziError>>> = Arc::new(Mutex::new(None));
        for (k, data) in blocks.into_iter().enumerate() {
            let block_id = first_id + k as u64;
            let ctx = self.ctx.clone();
            let out = Arc::clone(&self.out);
            let barrier = Arc::clone(&self.barrier);
            let first_error = Arc::clone(&first_error);
            let job = move || {
                if let Err(e) = encoder_task::run(block_id, &data, &ctx, &out, &barrier) {
                    let mut slot = first_error.lock().expect("error slot mutex poisoned");
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                }
            };
            match &self.pool {
                Some(pool) => pool.submit_job(Box::new(job)),
                None => job(),
            }
        }
        if let Some(pool) = &self.pool {
            pool.jobs_completed();
        }
        if let Some(e) = first_error.lock().expect("error slot mutex poisoned").take() {
            tracing::error!(%e, "aborting output stream on first encode task error");
            return Err(e);
        }
        Ok(())
    }

    /// §4.6 "close(): idempotent...".
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.process_block(true)?;

        let block_id = self.next_block_id;
        self.barrier.wait_for(block_id as i64);
        {
            let mut bits = self.out.lock().expect("output bit stream mutex poisoned");
            bits.write_bits(COPY_BLOCK_MASK as u64, 8)?;
            bits.write_bits(0, 8)?;
        }
        self.barrier.advance(block_id as i64);
        self.next_block_id += 1;

        self.out
            .lock()
            .expect("output bit stream mutex poisoned")
            .close()?;
        self.closed = true;
        Ok(())
    }
}

impl Drop for CompressedOutputStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
