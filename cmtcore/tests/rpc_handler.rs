use std::sync::Arc;

use cmtcore::{
    CmtError, DynError, DynResult, DynValue,
    rpc::{RpcHandler, RpcInternals, SerializedObj},
    runtime::native::NativeValue,
};

/// Serializes integers as little-endian bytes; running a call doubles it.
struct Doubler;

fn decode(payload: &[u8]) -> DynResult<i64> {
    let bytes: [u8; 8] = payload
        .try_into()
        .map_err(|_| DynError::new("ValueError", "payload must be 8 bytes"))?;
    Ok(i64::from_le_bytes(bytes))
}

impl RpcInternals for Doubler {
    fn run_function(&self, payload: &[u8], tensors: &[DynValue]) -> DynResult<DynValue> {
        let value = decode(payload)? * 2 + tensors.len() as i64;
        Ok(DynValue::new(NativeValue::Int(value)))
    }

    fn load_return_value(&self, payload: &[u8], _tensors: &[DynValue]) -> DynResult<DynValue> {
        Ok(DynValue::new(NativeValue::Int(decode(payload)?)))
    }

    fn serialize(&self, value: &DynValue) -> DynResult<SerializedObj> {
        match value.downcast_ref::<NativeValue>() {
            Some(NativeValue::Int(i)) => Ok(SerializedObj::new(i.to_le_bytes().to_vec(), vec![])),
            _ => Err(DynError::type_error("not an int")),
        }
    }

    fn handle_exception(&self, value: &DynValue) -> DynResult<()> {
        Err(DynError::new("RemoteException", value.repr()))
    }
}

#[test]
fn process_wide_handler_lifecycle() {
    assert!(matches!(RpcHandler::instance(), Err(CmtError::RpcHandlerMissing)));

    let installed = RpcHandler::install(Arc::new(Doubler));
    let again = RpcHandler::install(Arc::new(Doubler));
    assert!(std::ptr::eq(installed, again));

    let handler = RpcHandler::instance().unwrap();
    let request = handler.serialize(&DynValue::new(NativeValue::Int(21))).unwrap();

    let response = handler
        .generate_python_udf_result(&request.payload, &request.tensors)
        .unwrap();
    let result = handler.deserialize(&response).unwrap();
    assert!(result.value_eq(&DynValue::new(NativeValue::Int(42))).unwrap());

    let ran = handler.run_python_udf(&request).unwrap();
    assert!(ran.value_eq(&DynValue::new(NativeValue::Int(42))).unwrap());

    let loaded = handler.load_python_udf_result(&response.payload, &[]).unwrap();
    assert!(loaded.value_eq(&result).unwrap());

    let err = handler
        .handle_exception(&DynValue::new(NativeValue::Str("boom".into())))
        .unwrap_err();
    assert!(matches!(err, CmtError::Dynamic(ref e) if e.kind == "RemoteException"));

    handler.cleanup();
    assert!(matches!(
        handler.deserialize(&response),
        Err(CmtError::RpcHandlerReleased)
    ));
}
