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
//! Packet construction

use ledger_transport::APDUCommand;

use crate::errors::AppError;
use crate::params::MAX_PACKET_PAYLOAD;

/// Build a single packet.
///
/// The length byte is not supplied: it is derived from `data` when the
/// command is serialized, so it always matches the payload.
pub fn frame(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    budget: usize,
) -> Result<APDUCommand<Vec<u8>>, AppError> {
    let max = budget.min(MAX_PACKET_PAYLOAD);
    if data.len() > max {
        return Err(AppError::PayloadTooLarge {
            size: data.len(),
            max,
        });
    }

    Ok(APDUCommand {
        cla,
        ins,
        p1,
        p2,
        data,
    })
}
