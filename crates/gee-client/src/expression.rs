//! Serialized Earth Engine expression graphs.
//!
//! Earth Engine evaluates a computation described as a graph of value
//! nodes: `{"values": {"0": <node>, ...}, "result": "<key>"}`. A node is a
//! constant, an invocation of a named server-side algorithm, a function
//! definition (for per-image mapped transforms), or a reference to a
//! function argument. Arguments of an invocation point at other nodes by
//! key, so shared subgraphs are expressed once.
//!
//! The builder interns nodes in insertion order and hands out opaque
//! [`NodeRef`] handles; [`ExpressionBuilder::build`] fixes the result node
//! and produces the wire form.

use serde_json::{json, Map, Value};

/// Handle to a node inside one [`ExpressionBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(usize);

/// A completed expression graph in wire form.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Expression(Value);

impl Expression {
    /// The wire-form JSON value.
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

/// Incrementally builds an expression graph.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    nodes: Vec<Value>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, node: Value) -> NodeRef {
        self.nodes.push(node);
        NodeRef(self.nodes.len() - 1)
    }

    /// A constant leaf (string, number, bool, or array).
    pub fn constant(&mut self, value: impl Into<Value>) -> NodeRef {
        self.intern(json!({ "constantValue": value.into() }))
    }

    /// An invocation of a named server-side algorithm. Each argument
    /// references a previously interned node.
    pub fn invoke(&mut self, function: &str, args: &[(&str, NodeRef)]) -> NodeRef {
        let mut arguments = Map::new();
        for (name, node) in args {
            arguments.insert(
                (*name).to_string(),
                json!({ "valueReference": node.0.to_string() }),
            );
        }
        self.intern(json!({
            "functionInvocationValue": {
                "functionName": function,
                "arguments": Value::Object(arguments),
            }
        }))
    }

    /// A reference to a named argument of an enclosing function definition.
    pub fn argument(&mut self, name: &str) -> NodeRef {
        self.intern(json!({ "argumentReference": name }))
    }

    /// A function definition whose body is an already-built subgraph.
    /// Used as the `baseAlgorithm` of `Collection.map`.
    pub fn function(&mut self, argument_names: &[&str], body: NodeRef) -> NodeRef {
        self.intern(json!({
            "functionDefinitionValue": {
                "argumentNames": argument_names,
                "body": body.0.to_string(),
            }
        }))
    }

    /// Fix the result node and emit the wire form.
    pub fn build(self, result: NodeRef) -> Expression {
        let mut values = Map::new();
        for (index, node) in self.nodes.into_iter().enumerate() {
            values.insert(index.to_string(), node);
        }
        Expression(json!({
            "values": Value::Object(values),
            "result": result.0.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_graph() {
        let mut b = ExpressionBuilder::new();
        let c = b.constant(30);
        let expr = b.build(c);

        assert_eq!(
            expr.as_json(),
            &json!({
                "values": { "0": { "constantValue": 30 } },
                "result": "0",
            })
        );
    }

    #[test]
    fn test_invocation_references_interned_nodes() {
        let mut b = ExpressionBuilder::new();
        let id = b.constant("COPERNICUS/S2_SR_HARMONIZED");
        let col = b.invoke("ImageCollection.load", &[("id", id)]);
        let expr = b.build(col);
        let json = expr.as_json();

        assert_eq!(json["result"], "1");
        let invocation = &json["values"]["1"]["functionInvocationValue"];
        assert_eq!(invocation["functionName"], "ImageCollection.load");
        assert_eq!(invocation["arguments"]["id"]["valueReference"], "0");
        // the referenced key must exist
        assert!(json["values"]["0"].get("constantValue").is_some());
    }

    #[test]
    fn test_mapped_function_definition() {
        let mut b = ExpressionBuilder::new();
        let img = b.argument("img");
        let bands = b.constant(serde_json::json!(["SCL"]));
        let scl = b.invoke("Image.select", &[("input", img), ("bandSelectors", bands)]);
        let f = b.function(&["img"], scl);
        let expr = b.build(f);
        let json = expr.as_json();

        let def = &json["values"][json["result"].as_str().unwrap()]["functionDefinitionValue"];
        assert_eq!(def["argumentNames"][0], "img");
        let body_key = def["body"].as_str().unwrap();
        assert_eq!(
            json["values"][body_key]["functionInvocationValue"]["functionName"],
            "Image.select"
        );
    }

    #[test]
    fn test_every_reference_resolves() {
        let mut b = ExpressionBuilder::new();
        let id = b.constant("COPERNICUS/S2_SR_HARMONIZED");
        let col = b.invoke("ImageCollection.load", &[("id", id)]);
        let size = b.invoke("Collection.size", &[("collection", col)]);
        let expr = b.build(size);
        let json = expr.as_json();
        let values = json["values"].as_object().unwrap();

        for node in values.values() {
            if let Some(inv) = node.get("functionInvocationValue") {
                for arg in inv["arguments"].as_object().unwrap().values() {
                    let key = arg["valueReference"].as_str().unwrap();
                    assert!(values.contains_key(key), "dangling reference {}", key);
                }
            }
        }
        assert!(values.contains_key(json["result"].as_str().unwrap()));
    }
}
