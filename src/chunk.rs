/*******************************************************************************
*   (c) 2018 - 2023 Zondax AG
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! Multi-packet exchanges
//!
//! A logical operation is an optional header (path, HRP) followed by a body
//! (transaction bytes) that is split into chunks. Packets are sent strictly in
//! order, one at a time; the answer to the last packet is the result of the
//! whole operation. Any failure abandons the session: the device state is
//! undefined afterwards, so the caller restarts from scratch.

use std::convert::TryFrom;

use ledger_transport::{APDUCommand, Exchange};
use ledger_zondax_generic::ChunkPayloadType;
use log::{debug, trace};

use crate::apdu::frame;
use crate::errors::{classify, AppError, CosmosError};
use crate::params::{CHUNK_SIZE, MAX_PACKET_COUNT, MAX_PACKET_PAYLOAD};

/// How packets of a sequence are told apart by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequencing {
    /// p1 is INIT on the first packet, LAST on the final one and ADD in between
    Staged,
    /// p1 is the 1-based packet index, p2 the packet count
    Indexed,
}

/// Transaction encoding understood by the Cosmos app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SignMode {
    /// Legacy amino JSON
    Amino = 0,
    /// SIGN_MODE_TEXTUAL
    Textual = 1,
}

impl TryFrom<u8> for SignMode {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SignMode::Amino),
            1 => Ok(SignMode::Textual),
            other => Err(AppError::InvalidSignMode(other)),
        }
    }
}

/// Static description of a chunked operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// p2 for staged sequencing (sign mode), ignored when indexed
    pub p2: u8,
    /// Maximum body bytes per packet
    pub chunk_size: usize,
    /// Packet sequencing scheme
    pub sequencing: Sequencing,
}

impl ChunkPlan {
    /// Staged plan with the default chunk size
    pub fn staged(cla: u8, ins: u8, p2: u8) -> Self {
        ChunkPlan {
            cla,
            ins,
            p2,
            chunk_size: CHUNK_SIZE,
            sequencing: Sequencing::Staged,
        }
    }

    /// Indexed plan with the default chunk size
    pub fn indexed(cla: u8, ins: u8) -> Self {
        ChunkPlan {
            cla,
            ins,
            p2: 0,
            chunk_size: CHUNK_SIZE,
            sequencing: Sequencing::Indexed,
        }
    }

    /// Parameter bytes of packet `index` (1-based) out of `count`
    fn params(&self, index: usize, count: usize) -> (u8, u8) {
        match self.sequencing {
            Sequencing::Staged => {
                let p1 = if index == 1 {
                    ChunkPayloadType::Init
                } else if index == count {
                    ChunkPayloadType::Last
                } else {
                    ChunkPayloadType::Add
                };
                (p1 as u8, self.p2)
            }
            Sequencing::Indexed => (index as u8, count as u8),
        }
    }
}

/// Where a session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet
    Init,
    /// The header packet was sent
    SendingHeader,
    /// Body chunks are being sent
    SendingBody,
    /// Every packet was answered
    Done,
    /// A packet failed, the session is unusable
    Failed,
}

/// State of one logical operation
#[derive(Debug)]
pub struct ExchangeSession<'a> {
    plan: ChunkPlan,
    header: Option<Vec<u8>>,
    remaining: &'a [u8],
    packet_count: usize,
    packet_index: usize,
    awaiting_answer: bool,
    state: SessionState,
    last_response: Option<Vec<u8>>,
}

impl<'a> ExchangeSession<'a> {
    /// Plan a session. Everything that can be rejected is rejected here,
    /// before a single packet goes out.
    pub fn new(plan: ChunkPlan, header: Option<Vec<u8>>, body: &'a [u8]) -> Result<Self, AppError> {
        if plan.chunk_size == 0 {
            return Err(AppError::PayloadTooLarge {
                size: body.len(),
                max: 0,
            });
        }

        if plan.chunk_size > MAX_PACKET_PAYLOAD {
            return Err(AppError::PayloadTooLarge {
                size: plan.chunk_size,
                max: MAX_PACKET_PAYLOAD,
            });
        }

        if let Some(header) = &header {
            if header.len() > plan.chunk_size {
                return Err(AppError::PayloadTooLarge {
                    size: header.len(),
                    max: plan.chunk_size,
                });
            }
        } else if body.is_empty() {
            return Err(AppError::EmptyMessage);
        }

        let body_packets = (body.len() + plan.chunk_size - 1) / plan.chunk_size;
        let packet_count = usize::from(header.is_some()) + body_packets;
        if packet_count > MAX_PACKET_COUNT {
            return Err(AppError::InvalidMessageSize);
        }

        Ok(ExchangeSession {
            plan,
            header,
            remaining: body,
            packet_count,
            packet_index: 0,
            awaiting_answer: false,
            state: SessionState::Init,
            last_response: None,
        })
    }

    /// Total packets this session sends
    pub fn packet_count(&self) -> usize {
        self.packet_count
    }

    /// Index of the last packet handed out (0 before the first)
    pub fn packet_index(&self) -> usize {
        self.packet_index
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Next packet to send, `None` once the body is exhausted.
    ///
    /// The previous packet must have been answered through [`accept`](Self::accept).
    pub fn next_packet(&mut self) -> Result<Option<APDUCommand<Vec<u8>>>, AppError> {
        if self.state == SessionState::Failed || self.awaiting_answer {
            return Err(AppError::SessionAborted);
        }

        if self.state == SessionState::Init {
            if let Some(header) = self.header.take() {
                self.state = SessionState::SendingHeader;
                return self.emit(header).map(Some);
            }
        }

        if self.state == SessionState::Done || self.remaining.is_empty() {
            self.state = SessionState::Done;
            return Ok(None);
        }

        self.state = SessionState::SendingBody;
        let chunk = self.plan.chunk_size.min(self.remaining.len());
        let (data, rest) = self.remaining.split_at(chunk);
        self.remaining = rest;
        self.emit(data.to_vec()).map(Some)
    }

    fn emit(&mut self, data: Vec<u8>) -> Result<APDUCommand<Vec<u8>>, AppError> {
        let index = self.packet_index + 1;
        let (p1, p2) = self.plan.params(index, self.packet_count);
        let command = frame(self.plan.cla, self.plan.ins, p1, p2, data, self.plan.chunk_size)?;

        self.packet_index = index;
        self.awaiting_answer = true;
        Ok(command)
    }

    /// Record the answer to the packet just sent
    pub fn accept(&mut self, response: Vec<u8>) {
        self.awaiting_answer = false;
        self.last_response = Some(response);
    }

    /// Abandon the session
    pub fn fail(&mut self) {
        self.state = SessionState::Failed;
        self.last_response = None;
    }

    /// Answer of the final packet
    pub fn finish(self) -> Result<Vec<u8>, AppError> {
        match (self.state, self.last_response) {
            (SessionState::Done, Some(response)) => Ok(response),
            _ => Err(AppError::SessionAborted),
        }
    }
}

/// Drive a session over a transport until done or failed
pub async fn run<E>(
    transport: &E,
    mut session: ExchangeSession<'_>,
) -> Result<Vec<u8>, CosmosError<E::Error>>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    debug!(
        "exchange: {} packet(s) for ins 0x{:02X}",
        session.packet_count(),
        session.plan.ins
    );

    while let Some(command) = session.next_packet()? {
        trace!(
            "packet {}/{}: p1={} p2={} len={}",
            session.packet_index(),
            session.packet_count(),
            command.p1,
            command.p2,
            command.data.len()
        );

        let response = match transport.exchange(&command).await {
            Ok(response) => response,
            Err(err) => {
                session.fail();
                return Err(CosmosError::Transport(err));
            }
        };

        trace!("answer: retcode=0x{:04X}", response.retcode());
        if let Err(err) = classify(response.retcode(), response.data()) {
            debug!(
                "packet {}/{} failed: {}",
                session.packet_index(),
                session.packet_count(),
                err
            );
            session.fail();
            return Err(err.into());
        }

        session.accept(response.data().to_vec());
    }

    Ok(session.finish()?)
}

/// Send a single packet and classify its answer
pub async fn exchange_one<E>(
    transport: &E,
    command: &APDUCommand<Vec<u8>>,
) -> Result<Vec<u8>, CosmosError<E::Error>>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    let response = transport
        .exchange(command)
        .await
        .map_err(CosmosError::Transport)?;

    classify(response.retcode(), response.data())?;
    Ok(response.data().to_vec())
}
