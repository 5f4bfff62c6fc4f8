// ABI encoding and decoding on top of alloy's dynamic ABI codec

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::{Error as AbiError, Event, Function, JsonAbi, Param};
use alloy::primitives::keccak256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::parse_address;
use crate::error::{EthError, EthResult};
use crate::hashing::{bytes_to_hex, hex_to_bytes, is_hex};

/// Integers up to this width decode to JSON numbers; wider ones to strings.
const MAX_JSON_NUMBER_BITS: usize = 48;

/// A single ABI parameter: a Solidity type plus optional name and, for
/// `tuple` types, its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParameter {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParameter>,
}

impl AbiParameter {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: None,
            components: Vec::new(),
        }
    }

    pub fn named(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(ty)
        }
    }

    /// Type string with `tuple` expanded from the components, e.g.
    /// `tuple[]` with `(address, uint256)` components becomes `(address,uint256)[]`.
    fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) if !self.components.is_empty() => {
                let inner: Vec<String> =
                    self.components.iter().map(Self::canonical_type).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            _ => self.ty.clone(),
        }
    }

    fn resolve(&self) -> EthResult<DynSolType> {
        let canonical = self.canonical_type();
        DynSolType::parse(&canonical).map_err(|e| EthError::AbiType(format!("{canonical}: {e}")))
    }

    fn component_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

impl From<&Param> for AbiParameter {
    fn from(param: &Param) -> Self {
        Self {
            ty: param.ty.clone(),
            name: (!param.name.is_empty()).then(|| param.name.clone()),
            components: param.components.iter().map(Self::from).collect(),
        }
    }
}

/// A function call recovered from calldata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedFunctionCall {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

/// ABI-encodes `values` against `params`, returning `0x` hex.
pub fn encode_abi_parameters(params: &[AbiParameter], values: &[Value]) -> EthResult<String> {
    Ok(bytes_to_hex(&encode_values(params, values)?))
}

/// Decodes hex `data` against `params` into a JSON array of values.
pub fn decode_abi_parameters(params: &[AbiParameter], data: &str) -> EthResult<Value> {
    let bytes = parse_hex_data(data)?;
    Ok(Value::Array(decode_values(params, &bytes)?))
}

/// Encodes a call to `function_name` from a JSON ABI: selector followed by
/// the encoded arguments.
///
/// Overloads are narrowed by argument count, then by which ones accept the
/// argument values. More than one accepting overload is an error.
pub fn encode_function_data(abi: &str, function_name: &str, args: &[Value]) -> EthResult<String> {
    let abi = parse_json_abi(abi)?;
    let overloads = abi
        .function(function_name)
        .ok_or_else(|| EthError::FunctionNotFound(format!("{function_name:?} is not in the ABI")))?;

    let candidates: Vec<&Function> = overloads
        .iter()
        .filter(|f| f.inputs.len() == args.len())
        .collect();

    let mut encoded = Vec::new();
    let mut failures = Vec::new();
    for function in &candidates {
        match encode_values(&params_of(function), args) {
            Ok(values) => encoded.push((*function, values)),
            Err(e) => failures.push(e),
        }
    }

    match encoded.len() {
        1 => {
            let (function, values) = encoded.remove(0);
            let mut data = function.selector().to_vec();
            data.extend(values);
            Ok(bytes_to_hex(&data))
        }
        0 if candidates.len() == 1 => Err(failures.remove(0)),
        0 if candidates.is_empty() => Err(EthError::Encoding(format!(
            "no overload of {function_name:?} takes {} argument(s)",
            args.len()
        ))),
        0 => Err(EthError::Encoding(format!(
            "no overload of {function_name:?} accepts the arguments: {}",
            failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ))),
        _ => Err(EthError::Encoding(format!(
            "arguments match more than one overload of {function_name:?}: {}",
            encoded
                .iter()
                .map(|(function, _)| function.signature())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Decodes calldata against a JSON ABI, matching the function by selector.
pub fn decode_function_data(abi: &str, data: &str) -> EthResult<DecodedFunctionCall> {
    let abi = parse_json_abi(abi)?;
    let bytes = parse_hex_data(data)?;

    if bytes.len() < 4 {
        return Err(EthError::Decoding(format!(
            "calldata is {} byte(s), shorter than a function selector",
            bytes.len()
        )));
    }
    let (selector, encoded_args) = bytes.split_at(4);

    let function = abi
        .functions()
        .find(|f| f.selector().as_slice() == selector)
        .ok_or_else(|| {
            EthError::FunctionNotFound(format!(
                "no function with selector {} in the ABI",
                bytes_to_hex(selector)
            ))
        })?;

    let params = params_of(function);
    let args = decode_values(&params, encoded_args)?;

    Ok(DecodedFunctionCall {
        function_name: function.name.clone(),
        args: (!params.is_empty()).then_some(args),
    })
}

/// Derives the 4-byte selector of a function, event or error declaration.
///
/// Accepts a bare signature (`ownerOf(uint256)`), a declaration with names
/// and modifiers (`function ownerOf(uint256 tokenId) returns (address)`), and
/// `event`/`error` declarations. A trailing `{ ... }` body is ignored.
pub fn function_selector(abi_item: &str) -> EthResult<String> {
    let declaration = abi_item
        .split('{')
        .next()
        .unwrap_or(abi_item)
        .trim()
        .trim_end_matches(';')
        .trim();

    let invalid = |e| invalid_signature(declaration, e);

    let signature = if declaration.starts_with("event ") {
        Event::parse(declaration).map_err(invalid)?.signature()
    } else if declaration.starts_with("error ") {
        AbiError::parse(declaration).map_err(invalid)?.signature()
    } else {
        Function::parse(declaration).map_err(invalid)?.signature()
    };

    let hash = keccak256(signature.as_bytes());
    Ok(bytes_to_hex(&hash[..4]))
}

fn invalid_signature(declaration: &str, err: impl std::fmt::Display) -> EthError {
    EthError::InvalidSignature(format!("{declaration:?}: {err}"))
}

fn parse_json_abi(abi: &str) -> EthResult<JsonAbi> {
    serde_json::from_str(abi).map_err(|e| EthError::InvalidAbi(e.to_string()))
}

fn parse_hex_data(data: &str) -> EthResult<Vec<u8>> {
    if !is_hex(data) {
        return Err(EthError::InvalidHex("data must be a hex string".into()));
    }
    hex_to_bytes(data)
}

fn params_of(function: &Function) -> Vec<AbiParameter> {
    function.inputs.iter().map(AbiParameter::from).collect()
}

fn encode_values(params: &[AbiParameter], values: &[Value]) -> EthResult<Vec<u8>> {
    if params.len() != values.len() {
        return Err(EthError::Encoding(format!(
            "expected {} value(s), got {}",
            params.len(),
            values.len()
        )));
    }

    let encoded = params
        .iter()
        .zip(values)
        .map(|(param, value)| coerce(&param.resolve()?, &param.components, value))
        .collect::<EthResult<Vec<_>>>()?;

    Ok(DynSolValue::Tuple(encoded).abi_encode_params())
}

fn decode_values(params: &[AbiParameter], data: &[u8]) -> EthResult<Vec<Value>> {
    let types = params
        .iter()
        .map(AbiParameter::resolve)
        .collect::<EthResult<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| EthError::Decoding(e.to_string()))?;

    let DynSolValue::Tuple(values) = decoded else {
        return Err(EthError::Decoding("expected a parameter tuple".into()));
    };

    Ok(params
        .iter()
        .zip(&values)
        .map(|(param, value)| render(value, &param.components))
        .collect())
}

/// Converts a JSON value into an ABI value of type `ty`.
///
/// `components` names the fields of a tuple type (or of an array's tuple
/// element type) so tuples can also be given as JSON objects.
fn coerce(ty: &DynSolType, components: &[AbiParameter], value: &Value) -> EthResult<DynSolValue> {
    match ty {
        DynSolType::Array(inner) => {
            let items = expect_array(ty, value)?;
            let values = items
                .iter()
                .map(|item| coerce(inner, components, item))
                .collect::<EthResult<Vec<_>>>()?;
            Ok(DynSolValue::Array(values))
        }
        DynSolType::FixedArray(inner, len) => {
            let items = expect_array(ty, value)?;
            if items.len() != *len {
                return Err(EthError::Encoding(format!(
                    "{ty} expects {len} element(s), got {}",
                    items.len()
                )));
            }
            let values = items
                .iter()
                .map(|item| coerce(inner, components, item))
                .collect::<EthResult<Vec<_>>>()?;
            Ok(DynSolValue::FixedArray(values))
        }
        DynSolType::Tuple(types) => {
            let fields = tuple_fields(ty, components, value)?;
            if fields.len() != types.len() {
                return Err(EthError::Encoding(format!(
                    "{ty} expects {} field(s), got {}",
                    types.len(),
                    fields.len()
                )));
            }
            let values = types
                .iter()
                .zip(fields)
                .enumerate()
                .map(|(i, (field_ty, field))| {
                    let nested = components
                        .get(i)
                        .map(|c| c.components.as_slice())
                        .unwrap_or(&[]);
                    coerce(field_ty, nested, field)
                })
                .collect::<EthResult<Vec<_>>>()?;
            Ok(DynSolValue::Tuple(values))
        }
        _ => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(EthError::Encoding(format!(
                        "cannot encode {other} as {ty}"
                    )))
                }
            };
            if let DynSolType::Address = ty {
                return Ok(DynSolValue::Address(parse_address(&text)?));
            }
            ty.coerce_str(&text)
                .map_err(|e| EthError::Encoding(format!("{text:?} as {ty}: {e}")))
        }
    }
}

fn expect_array<'a>(ty: &DynSolType, value: &'a Value) -> EthResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| EthError::Encoding(format!("{ty} expects a JSON array, got {value}")))
}

fn tuple_fields<'a>(
    ty: &DynSolType,
    components: &[AbiParameter],
    value: &'a Value,
) -> EthResult<Vec<&'a Value>> {
    match value {
        Value::Array(items) => Ok(items.iter().collect()),
        Value::Object(map) => components
            .iter()
            .map(|component| {
                let name = component.component_name().ok_or_else(|| {
                    EthError::Encoding(format!(
                        "{ty} has unnamed components; pass it as a JSON array"
                    ))
                })?;
                map.get(name)
                    .ok_or_else(|| EthError::Encoding(format!("missing tuple field {name:?}")))
            })
            .collect(),
        other => Err(EthError::Encoding(format!(
            "{ty} expects a JSON array or object, got {other}"
        ))),
    }
}

/// Converts a decoded ABI value into JSON.
fn render(value: &DynSolValue, components: &[AbiParameter]) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(n, bits) => render_integer(n.to_string(), *bits),
        DynSolValue::Int(n, bits) => render_integer(n.to_string(), *bits),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => Value::String(bytes_to_hex(&word[..*size])),
        DynSolValue::Function(function) => Value::String(bytes_to_hex(function.as_slice())),
        DynSolValue::Bytes(bytes) => Value::String(bytes_to_hex(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            Value::Array(items.iter().map(|item| render(item, components)).collect())
        }
        DynSolValue::Tuple(items) => {
            let all_named = components.len() == items.len()
                && components.iter().all(|c| c.component_name().is_some());

            if all_named {
                let object = components
                    .iter()
                    .zip(items)
                    .map(|(component, item)| {
                        (
                            component.component_name().unwrap_or_default().to_string(),
                            render(item, &component.components),
                        )
                    })
                    .collect();
                Value::Object(object)
            } else {
                let nested = |i: usize| {
                    components
                        .get(i)
                        .map(|c| c.components.as_slice())
                        .unwrap_or(&[])
                };
                Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| render(item, nested(i)))
                        .collect(),
                )
            }
        }
        #[allow(unreachable_patterns)]
        other => Value::String(bytes_to_hex(&other.abi_encode())),
    }
}

fn render_integer(decimal: String, bits: usize) -> Value {
    if bits <= MAX_JSON_NUMBER_BITS {
        if let Ok(n) = decimal.parse::<i64>() {
            return Value::from(n);
        }
    }
    Value::String(decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ERC20_ABI: &str = r#"[
        {"type":"function","name":"transfer","stateMutability":"nonpayable",
         "inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],
         "outputs":[{"name":"","type":"bool"}]},
        {"type":"function","name":"totalSupply","stateMutability":"view",
         "inputs":[],"outputs":[{"name":"","type":"uint256"}]},
        {"type":"function","name":"submit","stateMutability":"nonpayable",
         "inputs":[{"name":"order","type":"tuple","components":[
            {"name":"maker","type":"address"},{"name":"amount","type":"uint256"}]}],
         "outputs":[]}
    ]"#;

    const RECIPIENT: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    #[test]
    fn encode_uint32_and_bytes() {
        let params = [AbiParameter::new("uint32"), AbiParameter::new("bytes")];
        let encoded =
            encode_abi_parameters(&params, &[json!(1), json!("0x1234567890")]).unwrap();

        let expected = concat!(
            "0x",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000040",
            "0000000000000000000000000000000000000000000000000000000000000005",
            "1234567890000000000000000000000000000000000000000000000000000000",
        );
        assert_eq!(encoded, expected);
    }

    #[test]
    fn encode_rejects_value_count_mismatch() {
        let params = [AbiParameter::new("uint256")];
        let err = encode_abi_parameters(&params, &[]).unwrap_err();
        assert!(matches!(err, EthError::Encoding(_)));
    }

    #[test]
    fn encode_rejects_unknown_type() {
        let params = [AbiParameter::new("uint7")];
        let err = encode_abi_parameters(&params, &[json!(1)]).unwrap_err();
        assert!(matches!(err, EthError::AbiType(_)));
    }

    #[test]
    fn decode_renders_small_ints_as_numbers_and_wide_ints_as_strings() {
        let params = [
            AbiParameter::new("uint32"),
            AbiParameter::new("uint256"),
            AbiParameter::new("bool"),
            AbiParameter::new("address"),
        ];
        let data = encode_abi_parameters(
            &params,
            &[
                json!(7),
                json!("1000000000000000000000"),
                json!(true),
                json!(RECIPIENT.to_lowercase()),
            ],
        )
        .unwrap();

        let decoded = decode_abi_parameters(&params, &data).unwrap();
        assert_eq!(
            decoded,
            json!([7, "1000000000000000000000", true, RECIPIENT])
        );
    }

    #[test]
    fn decode_named_tuple_renders_object() {
        let order = AbiParameter {
            ty: "tuple".into(),
            name: Some("order".into()),
            components: vec![
                AbiParameter::named("address", "maker"),
                AbiParameter::named("uint8", "side"),
            ],
        };
        let data =
            encode_abi_parameters(&[order.clone()], &[json!({"maker": RECIPIENT, "side": 1})])
                .unwrap();

        let decoded = decode_abi_parameters(&[order], &data).unwrap();
        assert_eq!(decoded, json!([{"maker": RECIPIENT, "side": 1}]));
    }

    #[test]
    fn decode_tuple_type_string_renders_array() {
        let params = [AbiParameter::new("(uint8,string)[]")];
        let data = encode_abi_parameters(&params, &[json!([[1, "a"], [2, "b"]])]).unwrap();

        let decoded = decode_abi_parameters(&params, &data).unwrap();
        assert_eq!(decoded, json!([[[1, "a"], [2, "b"]]]));
    }

    #[test]
    fn decode_rejects_non_hex() {
        let err = decode_abi_parameters(&[AbiParameter::new("uint256")], "hello").unwrap_err();
        assert!(matches!(err, EthError::InvalidHex(_)));
    }

    #[test]
    fn decode_rejects_truncated_data() {
        let err = decode_abi_parameters(&[AbiParameter::new("uint256")], "0x01").unwrap_err();
        assert!(matches!(err, EthError::Decoding(_)));
    }

    #[test]
    fn encode_erc20_transfer() {
        let data = encode_function_data(ERC20_ABI, "transfer", &[json!(RECIPIENT), json!("1")])
            .unwrap();

        assert!(data.starts_with("0xa9059cbb"));
        assert_eq!(data.len(), 2 + 8 + 64 * 2);
        assert!(data.ends_with("0000000000000000000000000000000000000000000000000000000000000001"));
    }

    const OVERLOADED_ABI: &str = r#"[
        {"type":"function","name":"foo","stateMutability":"nonpayable",
         "inputs":[{"name":"x","type":"uint256"}],"outputs":[]},
        {"type":"function","name":"foo","stateMutability":"nonpayable",
         "inputs":[{"name":"s","type":"string"}],"outputs":[]},
        {"type":"function","name":"foo","stateMutability":"nonpayable",
         "inputs":[{"name":"a","type":"address"},{"name":"b","type":"bool"}],"outputs":[]}
    ]"#;

    #[test]
    fn encode_picks_overload_that_accepts_the_arguments() {
        let data = encode_function_data(OVERLOADED_ABI, "foo", &[json!("hello")]).unwrap();

        let string_selector = bytes_to_hex(&keccak256("foo(string)".as_bytes())[..4]);
        assert!(data.starts_with(&string_selector));
    }

    #[test]
    fn encode_reports_ambiguous_overloads() {
        // "7" parses both as a uint256 and as a string
        let err = encode_function_data(OVERLOADED_ABI, "foo", &[json!("7")]).unwrap_err();
        assert!(
            matches!(&err, EthError::Encoding(msg) if msg.contains("foo(uint256)") && msg.contains("foo(string)")),
            "{err}"
        );
    }

    #[test]
    fn encode_single_candidate_keeps_its_error() {
        let err = encode_function_data(OVERLOADED_ABI, "foo", &[json!(RECIPIENT), json!("maybe")])
            .unwrap_err();
        assert!(matches!(err, EthError::Encoding(msg) if msg.contains("bool")));
    }

    #[test]
    fn encode_rejects_overload_count_mismatch() {
        let err = encode_function_data(OVERLOADED_ABI, "foo", &[]).unwrap_err();
        assert!(matches!(err, EthError::Encoding(msg) if msg.contains("takes 0 argument(s)")));
    }

    #[test]
    fn encode_rejects_bad_address_checksum() {
        let bad = "0x5AAEB6053F3E94C9b9A09f33669435E7Ef1BeAed";
        let err = encode_abi_parameters(&[AbiParameter::new("address")], &[json!(bad)]).unwrap_err();
        assert!(matches!(err, EthError::InvalidAddress(_)));

        let nested = encode_abi_parameters(&[AbiParameter::new("address[]")], &[json!([bad])])
            .unwrap_err();
        assert!(matches!(nested, EthError::InvalidAddress(_)));
    }

    #[test]
    fn encode_accepts_lowercase_and_checksummed_addresses() {
        let params = [AbiParameter::new("address")];
        let checksummed = encode_abi_parameters(&params, &[json!(RECIPIENT)]).unwrap();
        let lowercase =
            encode_abi_parameters(&params, &[json!(RECIPIENT.to_lowercase())]).unwrap();
        assert_eq!(checksummed, lowercase);
    }

    #[test]
    fn encode_unknown_function_errors() {
        let err = encode_function_data(ERC20_ABI, "approve", &[]).unwrap_err();
        assert!(matches!(err, EthError::FunctionNotFound(_)));
    }

    #[test]
    fn encode_rejects_invalid_abi_json() {
        let err = encode_function_data("not json", "transfer", &[]).unwrap_err();
        assert!(matches!(err, EthError::InvalidAbi(_)));
    }

    #[test]
    fn function_data_round_trip_with_struct_argument() {
        let data = encode_function_data(
            ERC20_ABI,
            "submit",
            &[json!({"maker": RECIPIENT, "amount": "42"})],
        )
        .unwrap();

        let decoded = decode_function_data(ERC20_ABI, &data).unwrap();
        assert_eq!(decoded.function_name, "submit");
        assert_eq!(
            decoded.args,
            Some(vec![json!({"maker": RECIPIENT, "amount": "42"})])
        );
    }

    #[test]
    fn decode_function_without_inputs_omits_args() {
        let decoded = decode_function_data(ERC20_ABI, "0x18160ddd").unwrap();
        assert_eq!(decoded.function_name, "totalSupply");
        assert_eq!(decoded.args, None);
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            json!({"functionName": "totalSupply"})
        );
    }

    #[test]
    fn decode_function_data_unknown_selector() {
        let err = decode_function_data(ERC20_ABI, "0xdeadbeef").unwrap_err();
        assert!(matches!(err, EthError::FunctionNotFound(_)));
    }

    #[test]
    fn decode_function_data_too_short() {
        let err = decode_function_data(ERC20_ABI, "0xa905").unwrap_err();
        assert!(matches!(err, EthError::Decoding(_)));
    }

    #[test]
    fn selector_from_signature_and_declaration() {
        assert_eq!(function_selector("ownerOf(uint256)").unwrap(), "0x6352211e");
        assert_eq!(
            function_selector("function ownerOf(uint256 tokenId) returns (address)").unwrap(),
            "0x6352211e"
        );
        assert_eq!(
            function_selector("function transfer(address to, uint256 amount) external returns (bool)")
                .unwrap(),
            "0xa9059cbb"
        );
    }

    #[test]
    fn selector_ignores_function_body() {
        let full = "function balanceOf(address owner) { return balances[owner]; }";
        assert_eq!(function_selector(full).unwrap(), "0x70a08231");
    }

    #[test]
    fn selector_of_event_and_error() {
        assert_eq!(
            function_selector("event Transfer(address indexed from, address indexed to, uint256 value)")
                .unwrap(),
            "0xddf252ad"
        );
        assert_eq!(
            function_selector("error Error(string)").unwrap(),
            "0x08c379a0"
        );
    }

    #[test]
    fn selector_rejects_garbage() {
        let err = function_selector("not a function").unwrap_err();
        assert!(matches!(err, EthError::InvalidSignature(_)));
    }

    #[test]
    fn canonical_type_expands_tuple_components() {
        let param = AbiParameter {
            ty: "tuple[2]".into(),
            name: None,
            components: vec![AbiParameter::new("address"), AbiParameter::new("uint256")],
        };
        assert_eq!(param.canonical_type(), "(address,uint256)[2]");
    }
}
