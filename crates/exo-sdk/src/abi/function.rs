//! Function declarations: named, typed parameters and a derived selector

use super::decode::decode;
use super::encode::{encode_call, function_selector};
use super::types::{ParamType, Token};
use crate::SdkError;

/// One named parameter of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name as declared
    pub name: String,
    /// ABI type
    pub kind: ParamType,
    /// Value used when the caller does not supply one
    pub default: Option<Token>,
}

/// Arguments keyed by parameter name, in the order they were supplied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedArgs(Vec<(String, Token)>);

impl NamedArgs {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument (builder style)
    pub fn with(mut self, name: impl Into<String>, value: Token) -> Self {
        self.push(name, value);
        self
    }

    /// Add an argument
    pub fn push(&mut self, name: impl Into<String>, value: Token) {
        self.0.push((name.into(), value));
    }

    /// Look up an argument by name
    pub fn get(&self, name: &str) -> Option<&Token> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Supplied names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    /// Number of supplied arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Nothing supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A callable function of a precompile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Canonical signature, e.g. `updateToken(uint32,bytes,string)`
    pub signature: String,
    /// keccak256(signature)[..4]
    pub selector: [u8; 4],
    /// Ordered inputs
    pub inputs: Vec<Param>,
    /// Ordered outputs
    pub outputs: Vec<Param>,
}

impl FunctionDef {
    /// Build from a name and parameter lists; the signature and selector
    /// are derived from the input types.
    pub fn new(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        let name = name.into();
        let types: Vec<String> = inputs.iter().map(|p| p.kind.to_string()).collect();
        let signature = format!("{}({})", name, types.join(","));
        let selector = function_selector(&signature);
        Self {
            name,
            signature,
            selector,
            inputs,
            outputs,
        }
    }

    /// Parse a Solidity-style declaration.
    ///
    /// `decl` is `name(type name, ...)`; `outputs` is `(type name, ...)`.
    /// Tuple types are written inline: `(string denom, uint256 amount)[] rewards`.
    pub fn parse(decl: &str, outputs: &str) -> Result<Self, SdkError> {
        let decl = decl.trim();
        let open = decl
            .find('(')
            .ok_or_else(|| malformed(decl, "missing parameter list"))?;
        let name = decl[..open].trim();
        if name.is_empty() {
            return Err(malformed(decl, "missing function name"));
        }
        let inputs = parse_param_list(&decl[open..])?;
        let outputs = parse_param_list(outputs.trim())?;
        Ok(Self::new(name, inputs, outputs))
    }

    /// Give `param` a default value
    pub fn with_default(mut self, param: &str, value: Token) -> Result<Self, SdkError> {
        let target = self
            .inputs
            .iter_mut()
            .find(|p| p.name == param)
            .ok_or_else(|| {
                SdkError::InputEncoding(format!("{} has no parameter `{}`", self.name, param))
            })?;
        target.default = Some(value);
        Ok(self)
    }

    /// Input types in declaration order
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Output types in declaration order
    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Whether an input with this name exists
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|p| p.name == name)
    }

    /// Order named arguments by position, filling defaults.
    ///
    /// An undeclared or repeated argument, or a required parameter with no
    /// value and no default, is an [`SdkError::InputEncoding`].
    pub fn bind(&self, args: &NamedArgs) -> Result<Vec<Token>, SdkError> {
        if let Some(unknown) = args.names().find(|n| !self.has_input(n)) {
            return Err(SdkError::InputEncoding(format!(
                "{} does not take an argument `{}`",
                self.signature, unknown
            )));
        }
        let names: Vec<&str> = args.names().collect();
        if let Some((i, _)) = names
            .iter()
            .enumerate()
            .find(|&(i, n)| names[..i].contains(n))
        {
            return Err(SdkError::InputEncoding(format!(
                "{}: argument `{}` supplied more than once",
                self.name, names[i]
            )));
        }

        self.inputs
            .iter()
            .map(|param| {
                args.get(&param.name)
                    .or(param.default.as_ref())
                    .cloned()
                    .ok_or_else(|| {
                        SdkError::InputEncoding(format!(
                            "{}: missing required argument `{}`",
                            self.name, param.name
                        ))
                    })
            })
            .collect()
    }

    /// Bind then encode
    pub fn encode_named(&self, args: &NamedArgs) -> Result<Vec<u8>, SdkError> {
        let tokens = self.bind(args)?;
        encode_call(self, &tokens)
    }

    /// Decode return data
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, SdkError> {
        decode(&self.output_types(), data)
    }
}

/// Parse a type string such as `uint256`, `bytes32[2]` or `(string,uint256)[]`
pub fn parse_type(s: &str) -> Result<ParamType, SdkError> {
    let s = s.trim();

    if let Some(rest) = s.strip_suffix(']') {
        let open = rest
            .rfind('[')
            .ok_or_else(|| malformed(s, "unbalanced brackets"))?;
        let inner = parse_type(&rest[..open])?;
        let size = &rest[open + 1..];
        return if size.is_empty() {
            Ok(ParamType::Array(Box::new(inner)))
        } else {
            let size: usize = size
                .parse()
                .map_err(|_| malformed(s, "invalid array size"))?;
            Ok(ParamType::FixedArray(Box::new(inner), size))
        };
    }

    if s.starts_with('(') {
        let params = parse_param_list(s)?;
        return Ok(ParamType::Tuple(params.into_iter().map(|p| p.kind).collect()));
    }

    match s {
        "address" => return Ok(ParamType::Address),
        "bool" => return Ok(ParamType::Bool),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        "uint" => return Ok(ParamType::Uint(256)),
        _ => {}
    }

    if let Some(bits) = s.strip_prefix("uint") {
        let bits: usize = bits.parse().map_err(|_| malformed(s, "invalid uint size"))?;
        if bits == 0 || bits > 256 || bits % 8 != 0 {
            return Err(malformed(s, "invalid uint size"));
        }
        return Ok(ParamType::Uint(bits));
    }

    if let Some(size) = s.strip_prefix("bytes") {
        let size: usize = size.parse().map_err(|_| malformed(s, "invalid bytes size"))?;
        if size == 0 || size > 32 {
            return Err(malformed(s, "invalid bytes size"));
        }
        return Ok(ParamType::FixedBytes(size));
    }

    Err(malformed(s, "unknown type"))
}

/// `(type name, ...)` including the parentheses
fn parse_param_list(s: &str) -> Result<Vec<Param>, SdkError> {
    let inner = s
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(|| malformed(s, "expected a parenthesized list"))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(inner)?
        .into_iter()
        .enumerate()
        .map(|(i, part)| parse_param(part, i))
        .collect()
}

fn parse_param(s: &str, position: usize) -> Result<Param, SdkError> {
    let s = s.trim();
    let mut depth = 0i32;
    let mut split = None;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => split = Some(i),
            _ => {}
        }
    }
    let (kind, name) = match split {
        Some(i) => (&s[..i], s[i..].trim().to_string()),
        None => (s, format!("arg{}", position)),
    };
    Ok(Param {
        name,
        kind: parse_type(kind)?,
        default: None,
    })
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(s: &str) -> Result<Vec<&str>, SdkError> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(malformed(s, "unbalanced parentheses"));
                }
            }
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(malformed(s, "unbalanced parentheses"));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn malformed(s: &str, reason: &str) -> SdkError {
    SdkError::InputEncoding(format!("malformed declaration `{}`: {}", s, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("address").unwrap(), ParamType::Address);
        assert_eq!(parse_type("uint").unwrap(), ParamType::Uint(256));
        assert_eq!(parse_type("uint32").unwrap(), ParamType::Uint(32));
        assert_eq!(parse_type("bytes").unwrap(), ParamType::Bytes);
        assert_eq!(parse_type("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(
            parse_type("uint32[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Uint(32)))
        );
        assert_eq!(
            parse_type("(bytes operator, uint256 numerator, uint256 denominator)[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Tuple(vec![
                ParamType::Bytes,
                ParamType::Uint(256),
                ParamType::Uint(256),
            ])))
        );
    }

    #[test]
    fn test_parse_type_rejects_bad_sizes() {
        assert!(parse_type("uint7").is_err());
        assert!(parse_type("uint264").is_err());
        assert!(parse_type("bytes33").is_err());
        assert!(parse_type("bytes0").is_err());
        assert!(parse_type("int256").is_err());
        assert!(parse_type("(uint8").is_err());
    }

    #[test]
    fn test_parse_declaration() {
        let f = FunctionDef::parse(
            "compoundReward(uint32 clientChainID, bytes stakerAddress, (string denom, uint256 amount)[] rewards, (bytes operator, uint256 numerator, uint256 denominator)[] allocations)",
            "(bool success)",
        )
        .unwrap();
        assert_eq!(f.name, "compoundReward");
        assert_eq!(
            f.signature,
            "compoundReward(uint32,bytes,(string,uint256)[],(bytes,uint256,uint256)[])"
        );
        let names: Vec<&str> = f.inputs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["clientChainID", "stakerAddress", "rewards", "allocations"]
        );
        assert_eq!(f.outputs.len(), 1);
        assert_eq!(f.outputs[0].name, "success");
    }

    #[test]
    fn test_parse_empty_lists() {
        let f = FunctionDef::parse("getClientChains()", "(bool, uint32[])").unwrap();
        assert!(f.inputs.is_empty());
        assert_eq!(f.signature, "getClientChains()");
        assert_eq!(f.outputs[0].name, "arg0");
        assert_eq!(f.outputs[1].kind, ParamType::Array(Box::new(ParamType::Uint(32))));
    }

    #[test]
    fn test_selector_matches_signature() {
        let f = FunctionDef::parse("transfer(address to, uint256 amount)", "(bool)").unwrap();
        assert_eq!(f.selector, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_bind_orders_and_fills_defaults() {
        let f = FunctionDef::parse(
            "undelegate(uint32 clientChainID, bytes assetsAddress, bool instantUnbond)",
            "(bool)",
        )
        .unwrap()
        .with_default("instantUnbond", Token::Bool(false))
        .unwrap();

        let args = NamedArgs::new()
            .with("assetsAddress", Token::Bytes(vec![1]))
            .with("clientChainID", Token::uint(101));
        assert_eq!(
            f.bind(&args).unwrap(),
            vec![Token::uint(101), Token::Bytes(vec![1]), Token::Bool(false)]
        );

        let args = args.with("instantUnbond", Token::Bool(true));
        assert_eq!(f.bind(&args).unwrap()[2], Token::Bool(true));
    }

    #[test]
    fn test_bind_rejects_missing_and_unknown() {
        let f = FunctionDef::parse("dissociateOperatorFromStaker(uint32 clientChainID, bytes staker)", "(bool)")
            .unwrap();

        let missing = NamedArgs::new().with("clientChainID", Token::uint(1));
        let err = f.bind(&missing).unwrap_err();
        assert!(err.to_string().contains("missing required argument `staker`"));

        let unknown = NamedArgs::new()
            .with("clientChainID", Token::uint(1))
            .with("staker", Token::Bytes(vec![1]))
            .with("lzNonce", Token::uint(0));
        let err = f.bind(&unknown).unwrap_err();
        assert!(err.to_string().contains("`lzNonce`"));
    }

    #[test]
    fn test_bind_rejects_repeated_argument() {
        let f = FunctionDef::parse("dissociateOperatorFromStaker(uint32 clientChainID, bytes staker)", "(bool)")
            .unwrap();

        let repeated = NamedArgs::new()
            .with("clientChainID", Token::uint(1))
            .with("staker", Token::Bytes(vec![1]))
            .with("clientChainID", Token::uint(2));
        let err = f.bind(&repeated).unwrap_err();
        assert!(matches!(err, SdkError::InputEncoding(_)));
        assert!(err
            .to_string()
            .contains("argument `clientChainID` supplied more than once"));
        assert!(f.encode_named(&repeated).is_err());
    }

    #[test]
    fn test_with_default_unknown_param() {
        let f = FunctionDef::parse("f(uint8 a)", "()").unwrap();
        assert!(f.with_default("b", Token::uint(0)).is_err());
    }
}
