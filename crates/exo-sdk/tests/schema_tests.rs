//! Schema registry tests across every domain and version

use exo_primitives::Address;
use exo_sdk::abi::{decode, encode_call, function_selector, ParamType, Token};
use exo_sdk::{Domain, SchemaRegistry, SchemaSelection, SchemaVersion, SdkError};

fn sample(kind: &ParamType) -> Token {
    match kind {
        ParamType::Address => Token::Address(Address::from_low_u16(0x0804)),
        ParamType::Uint(_) => Token::uint(1),
        ParamType::Bool => Token::Bool(true),
        ParamType::Bytes => Token::Bytes(vec![0xab; 20]),
        ParamType::FixedBytes(n) => Token::FixedBytes(vec![0xcd; *n]),
        ParamType::String => Token::String("exo".into()),
        ParamType::Array(inner) => Token::Array(vec![sample(inner), sample(inner)]),
        ParamType::FixedArray(inner, n) => Token::FixedArray(vec![sample(inner); *n]),
        ParamType::Tuple(types) => Token::Tuple(types.iter().map(sample).collect()),
    }
}

/// Every supported (asset, delegation, reward) version combination
fn registries() -> Vec<SchemaRegistry> {
    [SchemaVersion::V1, SchemaVersion::V2]
        .into_iter()
        .map(|version| {
            let mut selection = SchemaSelection::default();
            selection.delegation.version = version;
            SchemaRegistry::new(&selection).unwrap()
        })
        .collect()
}

#[test]
fn test_arity_is_enforced_for_every_entry() {
    for registry in registries() {
        for domain in Domain::ALL {
            let schema = registry.schema(domain);
            for function in schema.functions() {
                let args: Vec<Token> = function.inputs.iter().map(|p| sample(&p.kind)).collect();

                let data = encode_call(function, &args).unwrap();
                assert_eq!(&data[..4], &function.selector);
                assert_eq!(decode(&function.input_types(), &data[4..]).unwrap(), args);

                let mut long = args.clone();
                long.push(Token::uint(0));
                assert!(
                    matches!(encode_call(function, &long), Err(SdkError::InputEncoding(_))),
                    "{} {} accepted too many arguments",
                    schema.version(),
                    function.signature
                );

                if !args.is_empty() {
                    assert!(
                        matches!(
                            encode_call(function, &args[..args.len() - 1]),
                            Err(SdkError::InputEncoding(_))
                        ),
                        "{} {} accepted too few arguments",
                        schema.version(),
                        function.signature
                    );
                }
            }
        }
    }
}

#[test]
fn test_selectors_follow_signatures() {
    for registry in registries() {
        for domain in Domain::ALL {
            for function in registry.schema(domain).functions() {
                assert_eq!(function.selector, function_selector(&function.signature));
            }
        }
    }
}

#[test]
fn test_selectors_unique_per_schema() {
    for registry in registries() {
        for domain in Domain::ALL {
            let functions = registry.schema(domain).functions();
            for (i, a) in functions.iter().enumerate() {
                for b in &functions[i + 1..] {
                    assert_ne!(a.selector, b.selector, "{} vs {}", a.name, b.name);
                }
            }
        }
    }
}

#[test]
fn test_canonical_signatures() {
    let registry = SchemaRegistry::new(&SchemaSelection::default()).unwrap();
    let signature = |domain, name| {
        registry
            .resolve_function(domain, name)
            .unwrap()
            .function
            .signature
    };
    assert_eq!(
        signature(Domain::Asset, "depositLST"),
        "depositLST(uint32,bytes,bytes,uint256)"
    );
    assert_eq!(
        signature(Domain::Asset, "registerOrUpdateClientChain"),
        "registerOrUpdateClientChain(uint32,uint8,string,string,string)"
    );
    assert_eq!(
        signature(Domain::Delegation, "undelegate"),
        "undelegate(uint32,bytes,bytes,bytes,uint256,bool)"
    );
    assert_eq!(
        signature(Domain::Reward, "compoundReward"),
        "compoundReward(uint32,bytes,(string,uint256)[],(bytes,uint256,uint256)[])"
    );
}

#[test]
fn test_each_domain_has_its_own_destination() {
    let registry = SchemaRegistry::new(&SchemaSelection::default()).unwrap();
    let destinations: Vec<Address> = Domain::ALL
        .iter()
        .map(|d| registry.destination(*d))
        .collect();
    assert_eq!(
        destinations,
        vec![
            Address::from_low_u16(0x0804),
            Address::from_low_u16(0x0805),
            Address::from_low_u16(0x0806),
        ]
    );
    for domain in Domain::ALL {
        assert_eq!(registry.destination(domain), domain.default_destination());
    }
}

#[test]
fn test_unsupported_versions_rejected() {
    for domain in [Domain::Asset, Domain::Reward] {
        let mut selection = SchemaSelection::default();
        match domain {
            Domain::Asset => selection.asset.version = SchemaVersion::V2,
            _ => selection.reward.version = SchemaVersion::V2,
        }
        assert!(matches!(
            SchemaRegistry::new(&selection),
            Err(SdkError::UnsupportedOperation(_))
        ));
    }
}

#[test]
fn test_type_mismatch_names_parameter() {
    let registry = SchemaRegistry::new(&SchemaSelection::default()).unwrap();
    let function = registry
        .resolve_function(Domain::Asset, "depositLST")
        .unwrap()
        .function;
    let err = encode_call(
        &function,
        &[
            Token::uint(u64::from(u32::MAX) + 1),
            Token::Bytes(vec![1]),
            Token::Bytes(vec![2]),
            Token::uint(3),
        ],
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("depositLST"));
    assert!(message.contains("clientChainID"));
}
