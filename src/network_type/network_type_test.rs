use super::*;

#[test]
fn test_network_type_of() {
    let ipv4: IpAddr = "192.168.0.1".parse().unwrap();
    let ipv6: IpAddr = "fe80::a3:6ff:fec4:5454".parse().unwrap();

    assert_eq!(NetworkType::of(&ipv4), NetworkType::Udp4);
    assert_eq!(NetworkType::of(&ipv6), NetworkType::Udp6);
}

#[test]
fn test_network_type_serialization() {
    let tests = vec![(NetworkType::Udp4, "\"udp4\""), (NetworkType::Udp6, "\"udp6\"")];

    for (network_type, expected_string) in tests {
        assert_eq!(expected_string.to_string(), serde_json::to_string(&network_type).unwrap());
    }
}

#[test]
fn test_network_type_to_string() {
    assert_eq!(NetworkType::Udp4.to_string(), "udp4");
    assert_eq!(NetworkType::Udp6.to_string(), "udp6");
}
