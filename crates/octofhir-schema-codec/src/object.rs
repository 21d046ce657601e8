//! Object, union and array codecs

use crate::generator::WeakGenerator;
use crate::scalar::json_kind;
use crate::{Codec, CodecFn, CodecGenerator, CodecOptions, Direction, ValidationContext};
use octofhir_schema_diagnostics::{SCH0201, SCH0202, SCH0203, SCH0209, SCH0210, SCH0211};
use octofhir_schema_types::{AdditionalFields, ArrayType, DataType, FieldRef, TypeLink, UnionType};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

struct FieldPlan {
    field: FieldRef,
    required: bool,
    /// Declared fixed value or the type's discriminator value
    fixed: Option<Value>,
    options: CodecOptions,
    codec: OnceCell<Codec>,
}

struct ObjectPlan {
    direction: Direction,
    fields: Vec<FieldPlan>,
    /// Every declared field name, lowercased, including the ones not emitted
    known: HashSet<String>,
    omitted: Vec<String>,
    additional_fields: AdditionalFields,
    generator: WeakGenerator,
}

pub(crate) fn object_codec(
    generator: &CodecGenerator,
    ty: &Arc<DataType>,
    direction: Direction,
    options: &CodecOptions,
) -> Codec {
    let discriminator = ty.discriminator_field().zip(ty.discriminator_value());
    let mut known = HashSet::new();
    let mut fields = Vec::new();

    for field in ty.fields().into_iter().flatten() {
        known.insert(field.name.to_lowercase());
        if options.is_omitted(&field.name) {
            continue;
        }
        let skipped = match direction {
            Direction::Decode => options.ignore_readonly_fields && field.readonly,
            Direction::Encode => {
                (options.ignore_writeonly_fields && field.writeonly)
                    || !options.projects(&field.name, field.exclusive)
            }
        };
        if skipped {
            continue;
        }
        let fixed = field.fixed.clone().or_else(|| {
            discriminator
                .filter(|(name, _)| name.eq_ignore_ascii_case(&field.name))
                .map(|(_, value)| value.clone())
        });
        fields.push(FieldPlan {
            field: field.clone(),
            required: field.required && !options.partial,
            fixed,
            options: options.nested(&field.name),
            codec: OnceCell::new(),
        });
    }

    let plan = ObjectPlan {
        direction,
        fields,
        known,
        omitted: options.omit.iter().map(|o| o.to_lowercase()).collect(),
        additional_fields: ty.additional_fields(),
        generator: generator.downgrade(),
    };
    let func: CodecFn = Arc::new(move |value: &Value, ctx: &mut ValidationContext| plan.run(value, ctx));
    Codec::new(ty.name(), direction, func)
}

impl ObjectPlan {
    fn run(&self, value: &Value, ctx: &mut ValidationContext) -> Option<Value> {
        let Value::Object(input) = value else {
            ctx.report(SCH0203, format!("expected object, got {}", json_kind(value)));
            return None;
        };
        let before = ctx.issue_count();
        let mut output = Map::new();

        for plan in &self.fields {
            let name = plan.field.name.as_str();
            let found = match self.direction {
                Direction::Decode => input
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v),
                Direction::Encode => input.get(name),
            };
            if let Some(v) = ctx.at_key(name, |ctx| self.field_value(plan, found, ctx)) {
                output.insert(name.to_string(), v);
            }
        }

        for (key, v) in input {
            let lower = key.to_lowercase();
            if self.known.contains(&lower) || self.omitted.contains(&lower) {
                continue;
            }
            match self.additional_fields {
                AdditionalFields::Allow => {
                    output.entry(key.clone()).or_insert_with(|| v.clone());
                }
                AdditionalFields::Forbid => {}
                AdditionalFields::Error => {
                    ctx.at_key(key, |ctx| ctx.report(SCH0202, format!("unknown field '{key}'")));
                }
            }
        }

        (ctx.issue_count() == before).then_some(Value::Object(output))
    }

    fn field_value(&self, plan: &FieldPlan, found: Option<&Value>, ctx: &mut ValidationContext) -> Option<Value> {
        let value = match found {
            None => {
                if let Some(fixed) = &plan.fixed {
                    return Some(fixed.clone());
                }
                if let (Direction::Decode, Some(default)) = (self.direction, &plan.field.default) {
                    return Some(default.clone());
                }
                if plan.required {
                    ctx.report(SCH0201, "required field is missing");
                }
                return None;
            }
            Some(Value::Null) if plan.required => {
                ctx.report(SCH0201, "required field is null");
                return None;
            }
            Some(Value::Null) => return Some(Value::Null),
            Some(value) => value,
        };

        if let Some(fixed) = plan.fixed.as_ref().filter(|fixed| *fixed != value) {
            ctx.report(SCH0210, format!("expected {fixed}, got {value}"));
            return None;
        }

        let codec = plan
            .codec
            .get_or_init(|| self.generator.link_codec(&plan.field.ty, self.direction, &plan.options));
        if !plan.field.is_array {
            return codec.apply_in(value, ctx);
        }
        let Value::Array(items) = value else {
            ctx.report(SCH0203, format!("expected array, got {}", json_kind(value)));
            return None;
        };
        apply_items(codec, items, ctx)
    }
}

fn apply_items(codec: &Codec, items: &[Value], ctx: &mut ValidationContext) -> Option<Value> {
    let mut output = Vec::with_capacity(items.len());
    let mut valid = true;
    for (i, item) in items.iter().enumerate() {
        match ctx.at_index(i, |ctx| codec.apply_in(item, ctx)) {
            Some(v) => output.push(v),
            None => valid = false,
        }
    }
    valid.then_some(Value::Array(output))
}

pub(crate) fn array_codec(
    generator: &CodecGenerator,
    ty: &ArrayType,
    direction: Direction,
    options: &CodecOptions,
) -> Codec {
    let items: TypeLink = ty.items.clone();
    let (min, max) = (ty.min_items, ty.max_items);
    let options = options.clone();
    let weak = generator.downgrade();
    let item_codec: OnceCell<Codec> = OnceCell::new();

    let func: CodecFn = Arc::new(move |value: &Value, ctx: &mut ValidationContext| {
        let Value::Array(values) = value else {
            ctx.report(SCH0203, format!("expected array, got {}", json_kind(value)));
            return None;
        };
        let len = values.len();
        if let Some(min) = min.filter(|min| len < *min) {
            ctx.report(SCH0211, format!("{len} items, at least {min} required"));
            return None;
        }
        if let Some(max) = max.filter(|max| len > *max) {
            ctx.report(SCH0211, format!("{len} items, at most {max} allowed"));
            return None;
        }
        let codec = item_codec.get_or_init(|| weak.link_codec(&items, direction, &options));
        apply_items(codec, values, ctx)
    });
    Codec::new(&ty.info.name, direction, func)
}

/// Dispatch on the discriminator, otherwise the first member that accepts the value
pub(crate) fn union_codec(
    generator: &CodecGenerator,
    ty: &UnionType,
    direction: Direction,
    options: &CodecOptions,
) -> Codec {
    let members: Vec<Codec> = ty
        .members
        .iter()
        .map(|m| generator.codec_for(m, direction, options))
        .collect();
    let discriminator = ty
        .members
        .iter()
        .find_map(|m| m.discriminator_field())
        .map(str::to_string);
    let tagged: Vec<(Value, usize)> = ty
        .members
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.discriminator_value().map(|v| (v.clone(), i)))
        .collect();
    let names: Vec<String> = ty.members.iter().map(|m| m.name().to_string()).collect();

    let func: CodecFn = Arc::new(move |value: &Value, ctx: &mut ValidationContext| {
        if let (Some(field), Value::Object(input)) = (&discriminator, value) {
            let tag = input
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(field))
                .map(|(_, v)| v);
            if let Some(&(_, i)) = tag.and_then(|tag| tagged.iter().find(|(v, _)| v == tag)) {
                return members[i].apply_in(value, ctx);
            }
        }

        let mut failures = Vec::with_capacity(members.len());
        for codec in &members {
            let mut trial = ctx.fork();
            if let Some(output) = codec.apply_in(value, &mut trial) {
                return Some(output);
            }
            failures.push((codec.type_name().to_string(), trial.into_issues()));
        }

        ctx.report(SCH0209, format!("value matches none of {}", names.join(", ")));
        for (member, issues) in failures {
            ctx.absorb(issues.into_iter().map(|mut issue| {
                issue.message = format!("[{member}] {}", issue.message);
                issue
            }));
        }
        None
    });
    Codec::new(&ty.info.name, direction, func)
}
