//! Token contract interface.
//!
//! Call encoding and return decoding go through these `sol!` bindings, which
//! makes call data a pure function of the method and its arguments. Event
//! decoding does not use them; see `events::schema`.

use alloy::sol;

sol! {
    interface ITCoin {
        /// One entry of the contract's own transfer bookkeeping.
        #[derive(Debug, PartialEq, Eq)]
        struct TransactionDetails {
            address from;
            address to;
            uint256 value;
            string message;
            uint256 timestamp;
            bytes32 txHash;
        }

        function name() external view returns (string);
        function symbol() external view returns (string);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);

        function transferWithDetails(address to, uint256 amount, string message) external returns (bool);
        function mintTokens(address to, uint256 amount) external;
        function burnTokens(uint256 amount) external;

        function getTotalTransactionDetailsCount() external view returns (uint256);
        function getTransactionDetailsByIndex(uint256 index) external view returns (TransactionDetails);
        function getAllTransactionDetails() external view returns (TransactionDetails[]);

        event Transfer(address indexed from, address indexed to, uint256 value);
        event TransferWithDetails(address indexed from, address indexed to, uint256 value, string message, uint256 timestamp);
    }
}
