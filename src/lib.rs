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
//! Support library for the Cosmos Ledger Nano S/X apps
//!
//! Every operation is a sequence of APDU packets sent one at a time through a
//! [`ledger_transport::Exchange`]. Results are returned fully decoded, or as a
//! single [`CosmosError`]; nothing is returned half way through a sequence.

#![deny(trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(missing_docs)]

use ledger_transport::Exchange;
use ledger_zondax_generic::App;
use log::{debug, warn};

pub mod apdu;
pub mod chunk;
pub mod errors;
pub mod hrp;
pub mod legacy;
pub mod params;
pub mod path;
pub mod response;
pub mod version;

pub use chunk::SignMode;
pub use errors::{AppError, CosmosError};
pub use legacy::{UserApp, ValidatorApp};
pub use path::{DerivationPath, PathCodec};
pub use response::{Address, PublicKey, Signature, Version, VersionLayout};

use apdu::frame;
use chunk::{exchange_one, run, ChunkPlan, ExchangeSession};
use params::{InstructionCode, APP_ID_COSMOS, CHUNK_SIZE, CLA, SECP256K1_COMPRESSED_PK_LEN};

/// Cosmos App
pub struct CosmosApp<E> {
    transport: E,
}

impl<E> App for CosmosApp<E> {
    const CLA: u8 = CLA;
}

/// Query and decode the app version
pub(crate) async fn query_version<E>(
    transport: &E,
    cla: u8,
    ins: u8,
    layout: VersionLayout,
) -> Result<Version, CosmosError<E::Error>>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    let command = frame(cla, ins, 0x00, 0x00, Vec::new(), CHUNK_SIZE)?;
    let response = exchange_one(transport, &command).await?;
    let version = Version::from_response(&response, layout)?;
    debug!("app version {} (mode 0x{:02X})", version, version.mode);
    Ok(version)
}

impl<E> CosmosApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Wrap a transport
    pub fn new(transport: E) -> Self {
        CosmosApp { transport }
    }

    /// Wrap a transport after making sure the Cosmos app is open and recent
    /// enough to be driven by this client
    pub async fn connect(transport: E) -> Result<Self, CosmosError<E::Error>> {
        let mut app = CosmosApp::new(transport);
        let version = app.version().await?;
        if version.is_debug() {
            warn!("Cosmos app {} is a debug build", version);
        }
        version::check_supported(APP_ID_COSMOS, &version)?;
        Ok(app)
    }

    /// Release the transport; dropping it closes the connection
    pub fn into_transport(self) -> E {
        self.transport
    }

    /// Retrieve the app version
    pub async fn version(&mut self) -> Result<Version, CosmosError<E::Error>> {
        query_version(
            &self.transport,
            Self::CLA,
            InstructionCode::GetVersion as u8,
            VersionLayout::Extended,
        )
        .await
    }

    /// Retrieves the compressed public key and the bech32 address
    pub async fn address(
        &mut self,
        path: &DerivationPath,
        hrp: &str,
        require_confirmation: bool,
    ) -> Result<Address, CosmosError<E::Error>> {
        // [hrpLen | hrp | path]
        let mut data = hrp::length_prefixed(hrp)?;
        data.extend_from_slice(&PathCodec::COSMOS.encode(path)?);

        let p1 = if require_confirmation { 1 } else { 0 };
        let command = frame(
            Self::CLA,
            InstructionCode::GetAddressAndPubKey as u8,
            p1,
            0x00,
            data,
            CHUNK_SIZE,
        )?;

        let response = exchange_one(&self.transport, &command).await?;
        Ok(Address::from_response(
            &response,
            SECP256K1_COMPRESSED_PK_LEN,
            hrp,
        )?)
    }

    /// Sign a transaction
    ///
    /// The transaction is opaque to this client; the device answers the
    /// LAST packet with a DER signature.
    pub async fn sign(
        &mut self,
        path: &DerivationPath,
        hrp: &str,
        mode: SignMode,
        message: &[u8],
    ) -> Result<Signature, CosmosError<E::Error>> {
        // [path | hrpLen | hrp]
        let mut header = PathCodec::COSMOS.encode(path)?;
        header.extend_from_slice(&hrp::length_prefixed(hrp)?);

        let plan = ChunkPlan::staged(Self::CLA, InstructionCode::Sign as u8, mode as u8);
        let session = ExchangeSession::new(plan, Some(header), message)?;
        let response = run(&self.transport, session).await?;

        Ok(Signature::from_response(&response)?)
    }
}
