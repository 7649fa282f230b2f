//! CLI command implementations.

use crate::AppContext;
use log::info;
use postchain_crypto::KeyPair;
use postchain_gtv::Gtv;
use postchain_rpc::RestClient;
use postchain_tx::{Gtx, SigningState};
use serde_json::Value;

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ────────────────────────────────────────────────────────────────

fn decode_hex(what: &str, s: &str) -> std::result::Result<Vec<u8>, Box<dyn std::error::Error>> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| format!("{} is not valid hex: {}", what, e).into())
}

/// `["name", [args...]]` → (name, args).
fn parse_operation(s: &str) -> std::result::Result<(String, Value), Box<dyn std::error::Error>> {
    let value: Value =
        serde_json::from_str(s).map_err(|e| format!("operation '{}' is not JSON: {}", s, e))?;
    match value {
        Value::Array(mut parts) if parts.len() == 2 => {
            let args = parts.pop().unwrap_or(Value::Null);
            match parts.pop() {
                Some(Value::String(name)) => Ok((name, args)),
                _ => Err(format!("operation name in '{}' must be a string", s).into()),
            }
        }
        _ => Err(format!("operation '{}' must be [name, [args...]]", s).into()),
    }
}

/// `key=value` where value is JSON, `0x` hex bytes, or plain text.
fn parse_query_arg(s: &str) -> std::result::Result<(String, Gtv), Box<dyn std::error::Error>> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("query argument '{}' must be key=value", s))?;

    let value = if let Some(hex_part) = raw.strip_prefix("0x") {
        Gtv::Bytes(decode_hex(key, hex_part)?)
    } else {
        match serde_json::from_str::<Value>(raw) {
            Ok(json) => Gtv::from_json(&json)?,
            Err(_) => Gtv::Text(raw.to_string()),
        }
    };
    Ok((key.to_string(), value))
}

fn state_name(state: SigningState) -> &'static str {
    match state {
        SigningState::Building => "unsigned",
        SigningState::PartiallySigned => "partially signed",
        SigningState::FullySigned => "fully signed",
    }
}

/// The node's chain must be the one the payload was built for.
fn ensure_same_chain(payload_brid: &str, target: Option<&str>) -> Result {
    match target {
        Some(target) if !target.eq_ignore_ascii_case(payload_brid) => Err(format!(
            "transaction is for blockchain {} but the node chain is {}",
            payload_brid, target
        )
        .into()),
        _ => Ok(()),
    }
}

// ─── Commands ───────────────────────────────────────────────────────────────

pub fn keygen() -> Result {
    let kp = KeyPair::generate();
    println!("Private key: {}", hex::encode(kp.private_key()));
    println!("Public key:  {}", hex::encode(kp.public_key()));
    Ok(())
}

pub fn build(ctx: &AppContext, operations: &[String], signers: &[String]) -> Result {
    let brid = ctx
        .blockchain_rid()
        .ok_or("--brid is required to build a transaction")?;
    let mut tx = Gtx::new(brid)?;

    for op in operations {
        let (name, args) = parse_operation(op)?;
        tx.add_operation_json(name, &args)?;
    }
    for signer in signers {
        tx.add_signer(decode_hex("signer", signer)?)?;
    }

    info!(
        "built transaction {} with {} operations and {} signers",
        tx.tx_rid(),
        tx.operations().len(),
        tx.signers().len()
    );
    println!("{}", tx.serialize());
    Ok(())
}

pub fn digest(payload: &str) -> Result {
    let tx = Gtx::deserialize(payload)?;
    println!("{}", tx.tx_rid());
    Ok(())
}

pub fn sign(payload: &str, private_key: &str) -> Result {
    let mut tx = Gtx::deserialize(payload)?;
    tx.sign(&decode_hex("private key", private_key)?, None)?;
    println!("{}", tx.serialize());
    Ok(())
}

pub fn attach(payload: &str, public_key: &str, signature: &str) -> Result {
    let mut tx = Gtx::deserialize(payload)?;
    tx.attach_signature(
        &decode_hex("public key", public_key)?,
        decode_hex("signature", signature)?,
    )?;
    tx.verify_signatures()?;
    println!("{}", tx.serialize());
    Ok(())
}

pub fn inspect(payload: &str) -> Result {
    let tx = Gtx::deserialize(payload)?;

    println!("Blockchain RID: {}", tx.blockchain_rid());
    println!("Transaction RID: {}", tx.tx_rid());
    println!("State: {}", state_name(tx.signing_state()));

    println!("Operations:");
    for (i, op) in tx.operations().iter().enumerate() {
        println!("  [{}] {}{}", i, op.name, Gtv::List(op.args.clone()));
    }

    println!("Signers:");
    for (i, signer) in tx.signers().iter().enumerate() {
        let slot = if tx.signature_for(signer).is_some() {
            "signed"
        } else {
            "missing"
        };
        println!("  [{}] {} ({})", i, hex::encode(signer), slot);
    }

    match tx.verify_signatures() {
        Ok(()) => println!("Signatures: ok"),
        Err(e) => println!("Signatures: {}", e),
    }
    Ok(())
}

pub async fn send(ctx: &AppContext, payload: &str, wait: bool) -> Result {
    let tx = Gtx::deserialize(payload)?;
    if tx.signing_state() != SigningState::FullySigned {
        let missing: Vec<String> = tx.missing_signers().iter().map(hex::encode).collect();
        return Err(format!("transaction is missing signatures from: {}", missing.join(", ")).into());
    }

    let own_brid = tx.blockchain_rid();
    let client = ctx.client(Some(own_brid.as_str())).await?;
    ensure_same_chain(&own_brid, client.blockchain_rid())?;
    let serialized = tx.serialize();
    let tx_rid = tx.tx_rid();

    println!("Posting {} to {} ...", tx_rid, client.url());
    if wait {
        client.post_and_wait_confirmation(&serialized, &tx_rid).await?;
        println!("Confirmed.");
    } else {
        client.post_transaction(&serialized).await?;
        println!("Posted.");
    }
    Ok(())
}

pub async fn query(ctx: &AppContext, name: &str, args: &[String]) -> Result {
    let client = ctx.client(None).await?;
    let parsed = args
        .iter()
        .map(|a| parse_query_arg(a.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let borrowed: Vec<(&str, Gtv)> = parsed
        .iter()
        .map(|(k, v)| (k.as_str(), v.clone()))
        .collect();

    let result = client.query(name, &borrowed).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub async fn brid(ctx: &AppContext, iid: i64) -> Result {
    let mut client = RestClient::with_config(ctx.rest.clone())?;
    let brid = client.initialize_brid_from_chain_id(iid).await?;
    println!("{}", brid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation() {
        let (name, args) = parse_operation(r#"["transfer", [1000, "alice"]]"#).unwrap();
        assert_eq!(name, "transfer");
        assert_eq!(args, serde_json::json!([1000, "alice"]));

        assert!(parse_operation(r#"{"transfer": 1}"#).is_err());
        assert!(parse_operation(r#"[1, []]"#).is_err());
        assert!(parse_operation("not json").is_err());
    }

    #[test]
    fn test_parse_query_arg() {
        assert_eq!(
            parse_query_arg("account=0xbeef").unwrap(),
            ("account".to_string(), Gtv::Bytes(vec![0xbe, 0xef]))
        );
        assert_eq!(
            parse_query_arg("limit=3").unwrap(),
            ("limit".to_string(), Gtv::Integer(3))
        );
        assert_eq!(
            parse_query_arg("name=alice").unwrap(),
            ("name".to_string(), Gtv::from("alice"))
        );
        assert!(parse_query_arg("novalue").is_err());
        assert!(parse_query_arg("flag=true").is_err());
    }

    #[test]
    fn test_ensure_same_chain() {
        assert!(ensure_same_chain("0a0b", Some("0a0b")).is_ok());
        assert!(ensure_same_chain("0a0b", Some("0A0B")).is_ok());
        assert!(ensure_same_chain("0a0b", None).is_ok());

        let err = ensure_same_chain("0a0b", Some("0c0d")).unwrap_err();
        assert!(err.to_string().contains("0c0d"), "{}", err);
    }

    #[test]
    fn test_decode_hex_prefix() {
        assert_eq!(decode_hex("key", "0x0102").unwrap(), vec![1, 2]);
        assert!(decode_hex("key", "zz").is_err());
    }
}
