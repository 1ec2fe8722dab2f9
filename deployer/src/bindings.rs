use alloy::sol;

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IMailbox {
        function quoteDispatch(
            uint32 destinationDomain,
            bytes32 recipientAddress,
            bytes calldata messageBody,
            bytes calldata metadata,
            address hook
        ) external view returns (uint256 fee);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IBytecodeRouter {
        function deploy(
            bytes calldata bytecode,
            bytes32 salt,
            bytes32[] calldata recipientAddresses,
            uint256[] calldata chains,
            bytes[] calldata customHookMetadatas,
            address[] calldata customHooks
        ) external payable returns (bytes32[] memory messageIds);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ISafe {
        function setup(
            address[] calldata _owners,
            uint256 _threshold,
            address to,
            bytes calldata data,
            address fallbackHandler,
            address paymentToken,
            uint256 payment,
            address paymentReceiver
        ) external;

        function addOwnerWithThreshold(address owner, uint256 _threshold) external;

        function removeOwner(address prevOwner, address owner, uint256 _threshold) external;

        function getOwners() external view returns (address[] memory);
    }
);

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ISafeProxyFactory {
        function proxyCreationCode() external pure returns (bytes memory);

        function createProxyWithNonce(
            address _singleton,
            bytes memory initializer,
            uint256 saltNonce
        ) external returns (address proxy);
    }
);

sol!(
    #[allow(missing_docs)]
    interface ISafeModuleSetup {
        function enableModules(address[] calldata modules) external;
    }
);

sol!(
    #[allow(missing_docs)]
    interface IMultiSend {
        function multiSend(bytes memory transactions) external payable;
    }
);

sol!(
    #[allow(missing_docs)]
    interface ISafe4337Module {
        function executeUserOp(address to, uint256 value, bytes calldata data, uint8 operation) external;
    }
);

// Typed-data payload the Safe 4337 module verifies for v0.6 user operations.
sol!(
    #[allow(missing_docs)]
    #[derive(Debug)]
    struct SafeOp {
        address safe;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes paymasterAndData;
        uint48 validAfter;
        uint48 validUntil;
        address entryPoint;
    }
);
