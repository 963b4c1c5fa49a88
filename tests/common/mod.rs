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
//! Scripted in-memory transport

#![allow(dead_code)]

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Mutex;

use async_trait::async_trait;
use ledger_transport::{APDUAnswer, APDUCommand, Exchange};

/// Mock transport errors
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// More packets were sent than answers were scripted
    #[error("no scripted answer left")]
    Exhausted,
    /// The scripted answer is shorter than a status word
    #[error("scripted answer is malformed")]
    BadAnswer,
    /// Simulated link failure
    #[error("device disconnected")]
    Disconnected,
}

/// Scripted reply to one packet
pub enum Reply {
    /// Answer body followed by the status word
    Answer(Vec<u8>, u16),
    /// Transport level failure
    Fail,
}

impl Reply {
    /// Successful answer
    pub fn ok(data: &[u8]) -> Self {
        Reply::Answer(data.to_vec(), 0x9000)
    }

    /// Answer with a status word
    pub fn status(data: &[u8], sw: u16) -> Self {
        Reply::Answer(data.to_vec(), sw)
    }
}

/// Records every packet and plays back scripted replies in order
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl MockTransport {
    /// Transport answering with `replies`, in order
    pub fn new(replies: Vec<Reply>) -> Self {
        MockTransport {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Serialized packets, in the order they were sent
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    /// Replies not consumed yet
    pub fn pending(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl Exchange for MockTransport {
    type Error = MockError;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        self.sent.lock().unwrap().push(command.serialize());

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Answer(mut data, sw)) => {
                data.extend_from_slice(&sw.to_be_bytes());
                APDUAnswer::from_answer(data).map_err(|_| MockError::BadAnswer)
            }
            Some(Reply::Fail) => Err(MockError::Disconnected),
            None => Err(MockError::Exhausted),
        }
    }
}

/// Header bytes (cla, ins, p1, p2, len) of a serialized packet
pub fn header(packet: &[u8]) -> [u8; 5] {
    [packet[0], packet[1], packet[2], packet[3], packet[4]]
}

/// Amino JSON transaction used across tests
pub fn dummy_tx() -> Vec<u8> {
    let tx = r#"{
        "account_number": 1,
        "chain_id": "some_chain",
        "fee": {
            "amount": [{"amount": 10, "denom": "DEN"}],
            "gas": 5
        },
        "memo": "MEMO",
        "msgs": ["SOMETHING"],
        "sequence": 3
    }"#;
    tx.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .into_bytes()
}
