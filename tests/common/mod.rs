use std::fs;
use std::path::{Path, PathBuf};

use prost::Message;
use tract_onnx::pb;
use tract_onnx::pb::attribute_proto::AttributeType;
use tract_onnx::pb::tensor_proto::DataType;
use tract_onnx::pb::tensor_shape_proto::{dimension, Dimension};
use tract_onnx::pb::type_proto;

use attrition_scoring::models::FEATURE_COUNT;

/// Writes `attrition.onnx`: `ArgMax(features @ weights + bias)` over two
/// classes, where only `num__Age` carries weight. Predicts `1` when the age
/// is above `age_cutoff` and `0` below it.
pub fn write_age_classifier(dir: &Path, age_cutoff: f32) -> PathBuf {
    let mut weights = vec![0.0f32; FEATURE_COUNT * 2];
    weights[1] = 1.0;

    let graph = pb::GraphProto {
        name: "age_classifier".to_string(),
        node: vec![
            node("MatMul", &["features", "weights"], "scores", vec![]),
            node("Add", &["scores", "bias"], "logits", vec![]),
            node(
                "ArgMax",
                &["logits"],
                "label",
                vec![int_attr("axis", 1), int_attr("keepdims", 0)],
            ),
        ],
        initializer: vec![
            float_tensor("weights", &[FEATURE_COUNT as i64, 2], weights),
            float_tensor("bias", &[2], vec![0.0, -age_cutoff]),
        ],
        input: vec![value_info("features", DataType::Float, &[1, FEATURE_COUNT as i64])],
        output: vec![value_info("label", DataType::Int64, &[1])],
        ..Default::default()
    };
    let model = pb::ModelProto {
        ir_version: 8,
        opset_import: vec![pb::OperatorSetIdProto {
            domain: String::new(),
            version: 13,
        }],
        producer_name: "attrition-scoring-tests".to_string(),
        graph: Some(graph),
        ..Default::default()
    };

    let path = dir.join("attrition.onnx");
    fs::write(&path, model.encode_to_vec()).unwrap();
    path
}

fn node(op_type: &str, inputs: &[&str], output: &str, attribute: Vec<pb::AttributeProto>) -> pb::NodeProto {
    pb::NodeProto {
        input: inputs.iter().map(|s| s.to_string()).collect(),
        output: vec![output.to_string()],
        name: output.to_string(),
        op_type: op_type.to_string(),
        attribute,
        ..Default::default()
    }
}

fn int_attr(name: &str, value: i64) -> pb::AttributeProto {
    pb::AttributeProto {
        name: name.to_string(),
        r#type: AttributeType::Int as i32,
        i: value,
        ..Default::default()
    }
}

fn float_tensor(name: &str, dims: &[i64], data: Vec<f32>) -> pb::TensorProto {
    pb::TensorProto {
        name: name.to_string(),
        dims: dims.to_vec(),
        data_type: DataType::Float as i32,
        float_data: data,
        ..Default::default()
    }
}

fn value_info(name: &str, elem_type: DataType, dims: &[i64]) -> pb::ValueInfoProto {
    let dim = dims
        .iter()
        .map(|&d| Dimension {
            value: Some(dimension::Value::DimValue(d)),
            ..Default::default()
        })
        .collect();
    pb::ValueInfoProto {
        name: name.to_string(),
        r#type: Some(pb::TypeProto {
            value: Some(type_proto::Value::TensorType(type_proto::Tensor {
                elem_type: elem_type as i32,
                shape: Some(pb::TensorShapeProto { dim }),
            })),
            ..Default::default()
        }),
        ..Default::default()
    }
}
