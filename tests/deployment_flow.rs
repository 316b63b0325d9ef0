use alloy_primitives::{keccak256, Address, B256, U256};
use fee_vault_launcher::deploy::abi::{decode_params, encode_params, AbiType, AbiValue};
use fee_vault_launcher::deploy::schema::token_constructor;
use fee_vault_launcher::{
    build_deployment, build_finalize_tokenization, build_initialize_tokenization,
    validate_intent, BuildError, DeploymentIntent, FeePreference, MockContractReader,
    NetworkRegistry, RewardRecipient, RpcError, SchemaVersion, TokenizationError,
    TokenizationRequest, ValidationError,
};
use futures::executor::block_on;
use serde_json::json;

fn registry() -> NetworkRegistry {
    let address = |byte: u8| format!("0x{}", format!("{byte:02x}").repeat(20));
    let raw = json!({
        "networks": [{
            "chain_id": 8453,
            "name": "base",
            "paired_asset": "0x4200000000000000000000000000000000000006",
            "v4": {
                "factory": address(0xf4),
                "locker": address(0x10),
                "static_fee_hook": address(0x5a),
                "dynamic_fee_hook": address(0xd7),
                "mev_module": address(0x3e),
                "vault_factory": address(0xfa),
                "tokenizer": address(0x70),
                "launch_buy_extension": address(0xb0),
                "vault_extension": address(0xe0),
                "token_creation_code": "0x6080604052"
            },
            "v3_1": {
                "factory": address(0xf3),
                "vault_factory": address(0xfb),
                "tokenizer": address(0x71),
                "token_creation_code": "0x6080604053"
            }
        }]
    })
    .to_string();
    NetworkRegistry::from_json_str(&raw).expect("registry json should load")
}

fn intent_json(recipients: serde_json::Value) -> DeploymentIntent {
    serde_json::from_value(json!({
        "chain_id": 8453,
        "version": "V4",
        "name": "Shared Fees",
        "symbol": "SHARE",
        "image": "ipfs://bafy",
        "admin": "0x00000000000000000000000000000000000000ad",
        "recipients": recipients,
        "nonce": format!("0x{}", "07".repeat(32))
    }))
    .expect("intent json should deserialize")
}

fn recipient_json(byte: u8, bps: u16, preference: &str) -> serde_json::Value {
    let address = format!("0x{}", format!("{byte:02x}").repeat(20));
    json!({
        "recipient": address,
        "admin": address,
        "bps": bps,
        "fee_preference": preference
    })
}

#[test]
fn deployment_plan_matches_independent_create2_and_routes_rewards_to_vaults() {
    let registry = registry();
    let network = registry.get(8453).expect("base configured");
    let reader = MockContractReader::new();
    let intent = intent_json(json!([
        recipient_json(1, 6_000, "PairedAsset"),
        recipient_json(2, 4_000, "PairedAsset"),
    ]));
    validate_intent(&intent).expect("intent should validate");

    let plan = block_on(build_deployment(network, &reader, &intent)).expect("plan should build");

    let nonce = B256::repeat_byte(0x07);
    let mut salt_preimage = [0u8; 64];
    salt_preimage[12..32].copy_from_slice(intent.admin.as_slice());
    salt_preimage[32..].copy_from_slice(nonce.as_slice());
    let salt = keccak256(salt_preimage);
    assert_eq!(plan.salt, salt);

    let metadata = r#"{"description":"","socialMediaUrls":[],"auditUrls":[]}"#;
    let context = r#"{"interface":"fee-vault-launcher","platform":"","messageId":"","id":""}"#;
    let (types, args) = token_constructor(&intent, metadata, context).expect("constructor");
    let mut init_code = hex::decode("6080604052").expect("creation code");
    init_code.extend(encode_params(&types, &args).expect("constructor args"));
    let expected_token = Address::repeat_byte(0xf4).create2(salt, keccak256(&init_code));
    assert_eq!(plan.predicted.token, expected_token);

    assert_eq!(reader.call_count(), 1);
    let vault = plan.predicted.vaults[&FeePreference::PairedAsset];
    assert_ne!(vault, Address::repeat_byte(1));

    assert_eq!(plan.to, Address::repeat_byte(0xf4));
    assert_eq!(plan.native_value, U256::ZERO);
    let selector_hash = keccak256(plan.signature.as_bytes());
    assert_eq!(&plan.calldata[..4], &selector_hash[..4]);

    let AbiType::Tuple(inputs) = AbiType::parse(&plan.signature["deployToken".len()..])
        .expect("signature parses")
    else {
        panic!("argument list must parse as a tuple");
    };
    let decoded = decode_params(&inputs, &plan.calldata[4..]).expect("calldata decodes");
    assert_eq!(decoded, vec![plan.record.clone()]);
    let fields = decoded[0].items().expect("deployment config tuple");
    let locker = fields[2].items().expect("locker tuple");
    assert_eq!(locker[1], AbiValue::addresses([vault, vault]));
    assert_eq!(locker[2], AbiValue::addresses([vault, vault]));
}

#[test]
fn too_many_recipients_is_reported_before_the_split() {
    let recipients = (1..=8)
        .map(|byte| recipient_json(byte, 1_250, "Both"))
        .collect::<Vec<_>>();
    let intent = intent_json(json!(recipients));
    assert_eq!(
        validate_intent(&intent),
        Err(ValidationError::TooManyRecipients { got: 8 })
    );
}

#[test]
fn vault_read_failures_surface_verbatim() {
    let registry = registry();
    let network = registry.get(8453).expect("base configured");
    let mut reader = MockContractReader::new();
    let intent = intent_json(json!([recipient_json(1, 10_000, "Both")]));
    let plan = block_on(build_deployment(network, &reader, &intent)).expect("first plan");
    let (_, calldata) = reader.calls().remove(0);

    reader.respond(calldata, Err(RpcError("execution reverted".to_string())));
    let err = block_on(build_deployment(network, &reader, &intent))
        .expect_err("rpc failure must surface");
    assert!(matches!(err, BuildError::Resolution(_)), "got {err:?}");
    assert_eq!(err.to_string(), "execution reverted");
    assert_ne!(plan.predicted.token, Address::ZERO);
}

#[test]
fn tokenization_round_trip_through_public_api() {
    let registry = registry();
    let network = registry.get(8453).expect("base configured");
    let reader = MockContractReader::new();
    let request = TokenizationRequest {
        chain_id: 8453,
        token: Address::repeat_byte(0x99),
        recipients: vec![RewardRecipient {
            recipient: Address::repeat_byte(0x01),
            admin: Address::repeat_byte(0x02),
            bps: 10_000,
            fee_preference: FeePreference::ProjectAsset,
        }],
        version: SchemaVersion::V3_1,
        paired_asset: None,
    };

    let initialized = block_on(build_initialize_tokenization(network, &reader, &request))
        .expect("initialize should build");
    assert_eq!(initialized.to, Address::repeat_byte(0x71));
    assert_eq!(reader.calls()[0].0, Address::repeat_byte(0xfb));

    let err = build_finalize_tokenization(network, &initialized.pending)
        .expect_err("pending id is unresolved");
    assert!(matches!(err, TokenizationError::UnresolvedPendingId { .. }));

    let pending = initialized.pending.with_pending_id(B256::repeat_byte(0x44));
    let finalized = build_finalize_tokenization(network, &pending).expect("finalize");
    assert_eq!(&finalized.calldata[..4], &keccak256("finalizeTokenization(bytes32)")[..4]);
    assert_eq!(&finalized.calldata[4..], B256::repeat_byte(0x44).as_slice());
}
