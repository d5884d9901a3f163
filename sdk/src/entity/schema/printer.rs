//! GraphQL SDL rendering of a built schema

use super::types::{ArgumentDefinition, OutputType, Schema, SchemaField};
use graphql_parser::Pos;
use graphql_parser::schema::{
    Definition, Document, Field, InputValue, ObjectType, ScalarType, SchemaDefinition, Type,
    TypeDefinition,
};
use std::collections::BTreeSet;

const QUERY_TYPE: &str = "Query";

fn pos() -> Pos {
    Pos { line: 1, column: 1 }
}

impl Schema {
    /// The schema as GraphQL SDL: a scalar per argument kind in use, an
    /// object type per node and the `Query` root.
    pub fn to_sdl(&self) -> String {
        self.to_document().to_string()
    }

    pub fn to_document(&self) -> Document<'static, String> {
        let mut definitions = vec![Definition::SchemaDefinition(SchemaDefinition {
            position: pos(),
            directives: vec![],
            query: Some(QUERY_TYPE.to_string()),
            mutation: None,
            subscription: None,
        })];

        let scalars: BTreeSet<&str> = self
            .objects()
            .iter()
            .flat_map(|object| object.arguments.iter())
            .map(|argument| argument.type_name.as_str())
            .collect();
        for scalar in scalars {
            definitions.push(Definition::TypeDefinition(TypeDefinition::Scalar(
                ScalarType {
                    position: pos(),
                    description: None,
                    name: scalar.to_string(),
                    directives: vec![],
                },
            )));
        }

        for object in self.objects() {
            definitions.push(Definition::TypeDefinition(TypeDefinition::Object(
                ObjectType {
                    position: pos(),
                    description: None,
                    name: object.name.clone(),
                    implements_interfaces: vec![],
                    directives: vec![],
                    fields: object.fields.iter().map(|field| self.sdl_field(field)).collect(),
                },
            )));
        }

        let query_fields = self
            .root_fields()
            .iter()
            .map(|root| Field {
                position: pos(),
                description: None,
                name: root.name.clone(),
                arguments: sdl_arguments(&root.arguments),
                field_type: self.sdl_type(&root.output),
                directives: vec![],
            })
            .collect();
        definitions.push(Definition::TypeDefinition(TypeDefinition::Object(
            ObjectType {
                position: pos(),
                description: None,
                name: QUERY_TYPE.to_string(),
                implements_interfaces: vec![],
                directives: vec![],
                fields: query_fields,
            },
        )));

        Document { definitions }
    }

    fn sdl_field(&self, field: &SchemaField) -> Field<'static, String> {
        Field {
            position: pos(),
            description: field.description.clone(),
            name: field.name.clone(),
            arguments: sdl_arguments(&field.arguments),
            field_type: self.sdl_type(&field.output),
            directives: vec![],
        }
    }

    fn sdl_type(&self, output: &OutputType) -> Type<'static, String> {
        match output {
            OutputType::Scalar(scalar) => Type::NamedType(scalar.graphql_name().to_string()),
            OutputType::Object(id) => Type::NamedType(self.object(*id).name.clone()),
            OutputType::List(inner) => Type::ListType(Box::new(self.sdl_type(inner))),
        }
    }
}

fn sdl_arguments(arguments: &[ArgumentDefinition]) -> Vec<InputValue<'static, String>> {
    arguments
        .iter()
        .map(|argument| InputValue {
            position: pos(),
            description: None,
            name: argument.name.clone(),
            value_type: Type::NamedType(argument.type_name.clone()),
            default_value: None,
            directives: vec![],
        })
        .collect()
}
