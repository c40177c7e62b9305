//! Double-array payload specs

use crate::prelude::*;

#[test]
fn double_array_decodes_bit_exact() {
    let values = [1.0, 2.5, -3.25];

    let telegram = Telegram::doubles(&values).unwrap();

    assert_eq!(telegram.code(), TelegramCode::DoubleArray);
    assert_eq!(telegram.size(), 5 + 3 * 8);
    let decoded = telegram.to_doubles().unwrap();
    assert_eq!(decoded.len(), values.len());
    for (got, want) in decoded.iter().zip(values) {
        assert_eq!(got.to_bits(), want.to_bits());
    }
}

#[tokio::test]
async fn double_array_survives_the_tcp_path() {
    let registry = PortRegistry::new();
    let (endpoint, port) = tcp_server(&registry);
    let mut peer = connect_peer(&endpoint, port).await;

    write_telegram(&mut peer, &Telegram::doubles(&[1.0, 2.5, -3.25]).unwrap()).await.unwrap();

    let got = tokio::time::timeout(WAIT, endpoint.recv(CodeFilter::Only(TelegramCode::DoubleArray)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(got.to_doubles().unwrap(), vec![1.0, 2.5, -3.25]);
    endpoint.close();
}
