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
//! Legacy user app and Tendermint validator app
//!
//! Both number their packets (p1 = index, p2 = count) instead of using
//! INIT/ADD/LAST, and send the path as `[depth][10 x u32]`.

use ledger_transport::Exchange;
use ledger_zondax_generic::App;

use crate::apdu::frame;
use crate::chunk::{exchange_one, run, ChunkPlan, ExchangeSession};
use crate::errors::CosmosError;
use crate::params::{
    UserInstruction, ValidatorInstruction, CHUNK_SIZE, CLA, ED25519_PK_LEN,
    SECP256K1_UNCOMPRESSED_PK_LEN, USER_REQUIRED_VERSION, VALIDATOR_CLA,
    VALIDATOR_REQUIRED_VERSION,
};
use crate::path::{DerivationPath, PathCodec};
use crate::response::{PublicKey, Signature, Version, VersionLayout};
use crate::version::{check_version, VersionPolicy};
use crate::{hrp, query_version};

/// Legacy Cosmos user app
pub struct UserApp<E> {
    transport: E,
}

impl<E> App for UserApp<E> {
    const CLA: u8 = CLA;
}

impl<E> UserApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Wrap a transport
    pub fn new(transport: E) -> Self {
        UserApp { transport }
    }

    /// Wrap a transport after checking the app version (>= 1.1.0)
    pub async fn connect(transport: E) -> Result<Self, CosmosError<E::Error>> {
        let mut app = UserApp::new(transport);
        let version = app.version().await?;
        check_version(&version, &USER_REQUIRED_VERSION, VersionPolicy::Lexicographic)?;
        Ok(app)
    }

    /// Release the transport
    pub fn into_transport(self) -> E {
        self.transport
    }

    /// Retrieve the app version
    pub async fn version(&mut self) -> Result<Version, CosmosError<E::Error>> {
        query_version(
            &self.transport,
            Self::CLA,
            UserInstruction::GetVersion as u8,
            VersionLayout::Short,
        )
        .await
    }

    /// Retrieve the uncompressed secp256k1 public key
    pub async fn public_key_secp256k1(
        &mut self,
        path: &DerivationPath,
    ) -> Result<PublicKey, CosmosError<E::Error>> {
        let command = frame(
            Self::CLA,
            UserInstruction::PublicKeySecp256k1 as u8,
            0x00,
            0x00,
            PathCodec::USER.encode(path)?,
            CHUNK_SIZE,
        )?;

        let response = exchange_one(&self.transport, &command).await?;
        Ok(PublicKey::from_response(
            &response,
            SECP256K1_UNCOMPRESSED_PK_LEN,
        )?)
    }

    /// Display the bech32 address on the device
    pub async fn show_address_secp256k1(
        &mut self,
        hrp: &str,
        path: &DerivationPath,
    ) -> Result<(), CosmosError<E::Error>> {
        let mut data = hrp::length_prefixed(hrp)?;
        data.extend_from_slice(&PathCodec::USER.encode(path)?);

        let command = frame(
            Self::CLA,
            UserInstruction::ShowAddressSecp256k1 as u8,
            0x00,
            0x00,
            data,
            CHUNK_SIZE,
        )?;

        exchange_one(&self.transport, &command).await?;
        Ok(())
    }

    /// Sign a transaction with secp256k1
    pub async fn sign_secp256k1(
        &mut self,
        path: &DerivationPath,
        message: &[u8],
    ) -> Result<Signature, CosmosError<E::Error>> {
        let header = PathCodec::USER.encode(path)?;
        let plan = ChunkPlan::indexed(Self::CLA, UserInstruction::SignSecp256k1 as u8);
        let session = ExchangeSession::new(plan, Some(header), message)?;

        Ok(Signature::from_response(&run(&self.transport, session).await?)?)
    }

    /// Hash a buffer on the device, returning the raw digest
    pub async fn hash(&mut self, message: &[u8]) -> Result<Vec<u8>, CosmosError<E::Error>> {
        let plan = ChunkPlan::indexed(Self::CLA, UserInstruction::Hash as u8);
        let session = ExchangeSession::new(plan, None, message)?;
        run(&self.transport, session).await
    }

    /// Retrieve the public key of the built-in test key
    pub async fn test_public_key_secp256k1(&mut self) -> Result<PublicKey, CosmosError<E::Error>> {
        let command = frame(
            Self::CLA,
            UserInstruction::TestPublicKeySecp256k1 as u8,
            0x00,
            0x00,
            Vec::new(),
            CHUNK_SIZE,
        )?;

        let response = exchange_one(&self.transport, &command).await?;
        Ok(PublicKey::from_response(
            &response,
            SECP256K1_UNCOMPRESSED_PK_LEN,
        )?)
    }

    /// Sign with the built-in test key (no path header)
    pub async fn test_sign_secp256k1(
        &mut self,
        message: &[u8],
    ) -> Result<Signature, CosmosError<E::Error>> {
        let plan = ChunkPlan::indexed(Self::CLA, UserInstruction::TestSignSecp256k1 as u8);
        let session = ExchangeSession::new(plan, None, message)?;

        Ok(Signature::from_response(&run(&self.transport, session).await?)?)
    }
}

/// Tendermint validator app
pub struct ValidatorApp<E> {
    transport: E,
}

impl<E> App for ValidatorApp<E> {
    const CLA: u8 = VALIDATOR_CLA;
}

impl<E> ValidatorApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Wrap a transport
    pub fn new(transport: E) -> Self {
        ValidatorApp { transport }
    }

    /// Wrap a transport after checking the app major version
    pub async fn connect(transport: E) -> Result<Self, CosmosError<E::Error>> {
        let mut app = ValidatorApp::new(transport);
        let version = app.version().await?;
        check_version(&version, &VALIDATOR_REQUIRED_VERSION, VersionPolicy::MajorOnly)?;
        Ok(app)
    }

    /// Release the transport
    pub fn into_transport(self) -> E {
        self.transport
    }

    /// Retrieve the app version
    pub async fn version(&mut self) -> Result<Version, CosmosError<E::Error>> {
        query_version(
            &self.transport,
            Self::CLA,
            ValidatorInstruction::GetVersion as u8,
            VersionLayout::Short,
        )
        .await
    }

    /// Retrieve the ed25519 public key
    pub async fn public_key_ed25519(
        &mut self,
        path: &DerivationPath,
    ) -> Result<PublicKey, CosmosError<E::Error>> {
        let command = frame(
            Self::CLA,
            ValidatorInstruction::PublicKeyEd25519 as u8,
            0x00,
            0x00,
            PathCodec::VALIDATOR.encode(path)?,
            CHUNK_SIZE,
        )?;

        let response = exchange_one(&self.transport, &command).await?;
        Ok(PublicKey::from_response(&response, ED25519_PK_LEN)?)
    }

    /// Sign a vote or proposal with ed25519; the signature is raw, not DER
    pub async fn sign_ed25519(
        &mut self,
        path: &DerivationPath,
        message: &[u8],
    ) -> Result<Signature, CosmosError<E::Error>> {
        let header = PathCodec::VALIDATOR.encode(path)?;
        let plan = ChunkPlan::indexed(Self::CLA, ValidatorInstruction::SignEd25519 as u8);
        let session = ExchangeSession::new(plan, Some(header), message)?;

        Ok(Signature::from_response(&run(&self.transport, session).await?)?)
    }
}
