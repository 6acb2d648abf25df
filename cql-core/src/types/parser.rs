//! Parsing of type names found in schema metadata.
//!
//! Two syntaxes are understood:
//!
//! - fully-qualified marshal class names, as in
//!   `org.apache.cassandra.db.marshal.MapType(org.apache.cassandra.db.marshal.UTF8Type,org.apache.cassandra.db.marshal.Int32Type)`;
//! - CQL type names, as in `map<text, frozen<list<int>>>`, where a bare
//!   identifier names a user-defined type that has to be looked up.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::{CqlError, Result};

use super::column::{ColumnTypeCode, TypeDescriptor, UdtColumnInfo};

const MARSHAL_PREFIX: &str = "org.apache.cassandra.db.marshal.";

/// Marshal classes of the scalar types, without the package prefix.
const FQ_SINGLE_TYPES: &[(&str, ColumnTypeCode)] = &[
    ("AsciiType", ColumnTypeCode::Ascii),
    ("LongType", ColumnTypeCode::Bigint),
    ("BytesType", ColumnTypeCode::Blob),
    ("BooleanType", ColumnTypeCode::Boolean),
    ("CounterColumnType", ColumnTypeCode::Counter),
    ("DecimalType", ColumnTypeCode::Decimal),
    ("DoubleType", ColumnTypeCode::Double),
    ("FloatType", ColumnTypeCode::Float),
    ("Int32Type", ColumnTypeCode::Int),
    ("UTF8Type", ColumnTypeCode::Varchar),
    ("TimestampType", ColumnTypeCode::Timestamp),
    ("DateType", ColumnTypeCode::Timestamp),
    ("UUIDType", ColumnTypeCode::Uuid),
    ("LexicalUUIDType", ColumnTypeCode::Uuid),
    ("IntegerType", ColumnTypeCode::Varint),
    ("TimeUUIDType", ColumnTypeCode::Timeuuid),
    ("InetAddressType", ColumnTypeCode::Inet),
    ("SimpleDateType", ColumnTypeCode::Date),
    ("TimeType", ColumnTypeCode::Time),
    ("ShortType", ColumnTypeCode::SmallInt),
    ("ByteType", ColumnTypeCode::TinyInt),
    ("DurationType", ColumnTypeCode::Duration),
];

/// CQL keywords of the scalar types.
const CQL_SINGLE_TYPES: &[(&str, ColumnTypeCode)] = &[
    ("ascii", ColumnTypeCode::Ascii),
    ("bigint", ColumnTypeCode::Bigint),
    ("blob", ColumnTypeCode::Blob),
    ("boolean", ColumnTypeCode::Boolean),
    ("counter", ColumnTypeCode::Counter),
    ("decimal", ColumnTypeCode::Decimal),
    ("double", ColumnTypeCode::Double),
    ("float", ColumnTypeCode::Float),
    ("int", ColumnTypeCode::Int),
    ("text", ColumnTypeCode::Text),
    ("timestamp", ColumnTypeCode::Timestamp),
    ("uuid", ColumnTypeCode::Uuid),
    ("varchar", ColumnTypeCode::Varchar),
    ("varint", ColumnTypeCode::Varint),
    ("timeuuid", ColumnTypeCode::Timeuuid),
    ("inet", ColumnTypeCode::Inet),
    ("date", ColumnTypeCode::Date),
    ("time", ColumnTypeCode::Time),
    ("smallint", ColumnTypeCode::SmallInt),
    ("tinyint", ColumnTypeCode::TinyInt),
    ("duration", ColumnTypeCode::Duration),
];

/// Looks up user-defined types by name while parsing CQL type names.
#[async_trait]
pub trait UdtResolver: Send + Sync {
    /// Returns the definition of `keyspace.name`, or `None` if it does not exist.
    async fn resolve_udt(&self, keyspace: &str, name: &str) -> Result<Option<UdtColumnInfo>>;
}

/// Parses a fully-qualified marshal type name.
///
/// The package prefix is optional. Unknown classes become custom types
/// carrying the full name.
///
/// # Example
///
/// ```
/// use cql_core::{parse_fq_type_name, ColumnTypeCode};
///
/// let desc = parse_fq_type_name(
///     "org.apache.cassandra.db.marshal.ListType(org.apache.cassandra.db.marshal.Int32Type)",
/// )
/// .unwrap();
/// assert_eq!(desc.type_code, ColumnTypeCode::List);
/// ```
pub fn parse_fq_type_name(name: &str) -> Result<TypeDescriptor> {
    let compact: String = name.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CqlError::TypeParse("empty type name".to_string()));
    }
    parse_fq(&compact)
}

fn parse_fq(name: &str) -> Result<TypeDescriptor> {
    let short = name.strip_prefix(MARSHAL_PREFIX).unwrap_or(name);
    let (head, params) = split_call(short, '(', ')')?;

    if let Some(params) = params {
        match head {
            "FrozenType" | "ReversedType" => return parse_fq(single_param(head, params)?),
            "ListType" => return Ok(TypeDescriptor::list(parse_fq(single_param(head, params)?)?)),
            "SetType" => return Ok(TypeDescriptor::set(parse_fq(single_param(head, params)?)?)),
            "MapType" => {
                let [key, value] = exact_params::<2>(head, params)?;
                return Ok(TypeDescriptor::map(parse_fq(key)?, parse_fq(value)?));
            }
            "TupleType" => {
                let elements = split_params(params)?
                    .into_iter()
                    .map(parse_fq)
                    .collect::<Result<Vec<_>>>()?;
                return Ok(TypeDescriptor::tuple(elements));
            }
            "UserType" => return parse_fq_udt(params),
            "VectorType" => {
                let [element, dimension] = exact_params::<2>(head, params)?;
                return Ok(TypeDescriptor::vector(
                    parse_fq(element)?,
                    Some(parse_dimension(dimension)?),
                ));
            }
            _ => {}
        }
    }

    if let Some((_, code)) = FQ_SINGLE_TYPES.iter().find(|(n, _)| *n == head) {
        if params.is_some() {
            return Err(CqlError::TypeParse(format!(
                "{} does not take parameters: {}",
                head, name
            )));
        }
        return Ok(TypeDescriptor::new(*code));
    }

    Ok(TypeDescriptor::custom(name))
}

/// `UserType(keyspace,hex_name,hex_field:type,...)`.
fn parse_fq_udt(params: &str) -> Result<TypeDescriptor> {
    let parts = split_params(params)?;
    let [keyspace, name, fields @ ..] = parts.as_slice() else {
        return Err(CqlError::TypeParse(format!(
            "UserType needs a keyspace and a name: UserType({})",
            params
        )));
    };

    let mut definition = UdtColumnInfo::new(*keyspace, decode_hex_name(name)?);
    for field in fields {
        let (field_name, field_type) = field.split_once(':').ok_or_else(|| {
            CqlError::TypeParse(format!("UserType field without a type: {}", field))
        })?;
        definition = definition.with_field(decode_hex_name(field_name)?, parse_fq(field_type)?);
    }
    Ok(TypeDescriptor::udt(definition))
}

fn decode_hex_name(encoded: &str) -> Result<String> {
    let bytes = hex::decode(encoded)
        .map_err(|e| CqlError::TypeParse(format!("invalid hex name {}: {}", encoded, e)))?;
    String::from_utf8(bytes)
        .map_err(|_| CqlError::TypeParse(format!("hex name {} is not UTF-8", encoded)))
}

/// Parses a CQL type name, resolving user-defined types in `keyspace`.
///
/// Built-in type keywords are case-insensitive. Unquoted UDT names are
/// lower-cased; double-quoted ones are taken as written. A name in single
/// quotes is a custom type class.
///
/// # Errors
///
/// [`CqlError::TypeParse`] for malformed names and for UDTs the resolver
/// does not know.
pub async fn parse_cql_type_name(
    resolver: &dyn UdtResolver,
    keyspace: &str,
    name: &str,
) -> Result<TypeDescriptor> {
    parse_cql(resolver, keyspace, name.trim()).await
}

type ParseFuture<'a> = Pin<Box<dyn Future<Output = Result<TypeDescriptor>> + Send + 'a>>;

fn parse_cql<'a>(resolver: &'a dyn UdtResolver, keyspace: &'a str, name: &'a str) -> ParseFuture<'a> {
    Box::pin(async move {
        if name.is_empty() {
            return Err(CqlError::TypeParse("empty type name".to_string()));
        }
        if let Some(class) = name
            .strip_prefix('\'')
            .and_then(|rest| rest.strip_suffix('\''))
        {
            return Ok(TypeDescriptor::custom(class));
        }

        let (head, params) = split_call(name, '<', '>')?;
        let keyword = head.trim().to_ascii_lowercase();

        if let Some(params) = params {
            return match keyword.as_str() {
                "frozen" => parse_cql(resolver, keyspace, single_param(head, params)?.trim()).await,
                "list" => {
                    let element = single_param(head, params)?.trim();
                    Ok(TypeDescriptor::list(parse_cql(resolver, keyspace, element).await?))
                }
                "set" => {
                    let element = single_param(head, params)?.trim();
                    Ok(TypeDescriptor::set(parse_cql(resolver, keyspace, element).await?))
                }
                "map" => {
                    let [key, value] = exact_params::<2>(head, params)?;
                    Ok(TypeDescriptor::map(
                        parse_cql(resolver, keyspace, key.trim()).await?,
                        parse_cql(resolver, keyspace, value.trim()).await?,
                    ))
                }
                "tuple" => {
                    let mut elements = Vec::new();
                    for element in split_params(params)? {
                        elements.push(parse_cql(resolver, keyspace, element.trim()).await?);
                    }
                    Ok(TypeDescriptor::tuple(elements))
                }
                "vector" => {
                    let [element, dimension] = exact_params::<2>(head, params)?;
                    Ok(TypeDescriptor::vector(
                        parse_cql(resolver, keyspace, element.trim()).await?,
                        Some(parse_dimension(dimension.trim())?),
                    ))
                }
                _ => Err(CqlError::TypeParse(format!("unknown parameterized type: {}", name))),
            };
        }

        if let Some((_, code)) = CQL_SINGLE_TYPES.iter().find(|(n, _)| *n == keyword) {
            return Ok(TypeDescriptor::new(*code));
        }

        let (udt_keyspace, udt_name) = match split_qualified(name) {
            Some((ks, udt)) => (unquote_identifier(ks), unquote_identifier(udt)),
            None => (keyspace.to_string(), unquote_identifier(name)),
        };
        match resolver.resolve_udt(&udt_keyspace, &udt_name).await? {
            Some(definition) => Ok(TypeDescriptor::udt(definition)),
            None => Err(CqlError::TypeParse(format!(
                "user-defined type {}.{} not found",
                udt_keyspace, udt_name
            ))),
        }
    })
}

/// Splits `head(params)` into the head and the text between the brackets.
///
/// Returns no params for a name without an opening bracket. The closing
/// bracket must end the name.
fn split_call(name: &str, open: char, close: char) -> Result<(&str, Option<&str>)> {
    let Some(start) = name.find(open) else {
        return Ok((name, None));
    };
    let params = name[start + open.len_utf8()..]
        .strip_suffix(close)
        .ok_or_else(|| CqlError::TypeParse(format!("unbalanced brackets in {}", name)))?;
    Ok((&name[..start], Some(params)))
}

/// Splits on commas that are not nested inside brackets.
fn split_params(params: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in params.char_indices() {
        match c {
            '(' | '<' => depth += 1,
            ')' | '>' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    CqlError::TypeParse(format!("unbalanced brackets in {}", params))
                })?;
            }
            ',' if depth == 0 => {
                parts.push(&params[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CqlError::TypeParse(format!(
            "unbalanced brackets in {}",
            params
        )));
    }
    parts.push(&params[start..]);
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(CqlError::TypeParse(format!(
            "empty type parameter in {}",
            params
        )));
    }
    Ok(parts)
}

fn exact_params<'a, const N: usize>(head: &str, params: &'a str) -> Result<[&'a str; N]> {
    let parts = split_params(params)?;
    let count = parts.len();
    <[&str; N]>::try_from(parts).map_err(|_| {
        CqlError::TypeParse(format!(
            "{} takes {} parameters, got {}",
            head, N, count
        ))
    })
}

fn single_param<'a>(head: &str, params: &'a str) -> Result<&'a str> {
    let [param] = exact_params::<1>(head, params)?;
    Ok(param)
}

fn parse_dimension(text: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| CqlError::TypeParse(format!("invalid vector dimension: {}", text)))
}

/// Splits `ks.name` on a dot outside double quotes.
fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let mut quoted = false;
    for (index, c) in name.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '.' if !quoted => return Some((&name[..index], &name[index + 1..])),
            _ => {}
        }
    }
    None
}

/// Applies CQL identifier rules: quoted names are case-sensitive.
fn unquote_identifier(identifier: &str) -> String {
    let identifier = identifier.trim();
    match identifier
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(quoted) => quoted.replace("\"\"", "\""),
        None => identifier.to_lowercase(),
    }
}
